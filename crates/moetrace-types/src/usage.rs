use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Phase;

/// Per-expert selection counts.
///
/// Backed by a `BTreeMap` so iteration order (and the serialized JSON)
/// is deterministic for identical contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpertUsage(BTreeMap<usize, u64>);

impl ExpertUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `expert` by one.
    pub fn bump(&mut self, expert: usize) {
        *self.0.entry(expert).or_insert(0) += 1;
    }

    pub fn count(&self, expert: usize) -> u64 {
        self.0.get(&expert).copied().unwrap_or(0)
    }

    /// Total selections across all experts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.0.iter().map(|(&e, &c)| (e, c))
    }

    /// Element-wise sum. Associative and commutative, which is what
    /// makes cross-session aggregation order-independent.
    pub fn merge(&mut self, other: &ExpertUsage) {
        for (expert, count) in other.iter() {
            *self.0.entry(expert).or_insert(0) += count;
        }
    }

    /// Top `n` experts by count, ties broken by ascending expert id.
    pub fn top_n(&self, n: usize) -> Vec<(usize, u64)> {
        let mut entries: Vec<(usize, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    /// Bottom `n` experts by count over the full domain
    /// `[0, num_experts)`, ties broken by ascending expert id. The map
    /// only holds experts that were selected at least once, so the
    /// domain has to be spelled out here for never-selected experts to
    /// rank at the bottom with count 0.
    pub fn bottom_n(&self, num_experts: usize, n: usize) -> Vec<(usize, u64)> {
        let mut entries: Vec<(usize, u64)> =
            (0..num_experts).map(|expert| (expert, self.count(expert))).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

/// Expert usage split by inference phase, plus the combined view.
///
/// Invariant: for every expert `e`,
/// `prefill.count(e) + generation.count(e) == overall.count(e)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasedUsage {
    pub overall: ExpertUsage,
    pub prefill: ExpertUsage,
    pub generation: ExpertUsage,
}

impl PhasedUsage {
    /// Record one selection of `expert` during `phase`, updating the
    /// phase bucket and the overall view together so the split/overall
    /// invariant holds by construction.
    pub fn bump(&mut self, phase: Phase, expert: usize) {
        self.overall.bump(expert);
        match phase {
            Phase::Prefill => self.prefill.bump(expert),
            Phase::Generation => self.generation.bump(expert),
        }
    }

    pub fn for_phase(&self, phase: Option<Phase>) -> &ExpertUsage {
        match phase {
            None => &self.overall,
            Some(Phase::Prefill) => &self.prefill,
            Some(Phase::Generation) => &self.generation,
        }
    }

    pub fn merge(&mut self, other: &PhasedUsage) {
        self.overall.merge(&other.overall);
        self.prefill.merge(&other.prefill);
        self.generation.merge(&other.generation);
    }
}

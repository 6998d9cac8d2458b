//! Pairwise expert co-activation counting and clustering.
//!
//! Co-occurrence is a per-token notion: two experts co-occur when both
//! appear in the union of a token's selections across all layers, not
//! when they share a single layer. The table is always derived from raw
//! token data on demand and never persisted; clustering is purely a
//! function of the table and a threshold.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use moetrace_types::{PairCount, TokenRecord};

/// Default relative-frequency threshold for cluster edges.
pub const DEFAULT_CLUSTER_THRESHOLD: f32 = 0.5;

/// Counts of unordered expert pairs (`a < b`) co-selected for the same
/// token.
#[derive(Debug, Clone, Default)]
pub struct CoOccurrence {
    counts: BTreeMap<(usize, usize), u64>,
}

impl CoOccurrence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one token's cross-layer expert union: every unordered
    /// pair within the union is counted once.
    pub fn record_token(&mut self, experts: &BTreeSet<usize>) {
        let experts: Vec<usize> = experts.iter().copied().collect();
        for (i, &a) in experts.iter().enumerate() {
            for &b in &experts[i + 1..] {
                *self.counts.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    /// Element-wise sum. Cross-session aggregation recomputes tables
    /// from each session's raw tokens and merges them here; clusters
    /// themselves are never merged.
    pub fn merge(&mut self, other: &CoOccurrence) {
        for (&pair, &count) in &other.counts {
            *self.counts.entry(pair).or_insert(0) += count;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, a: usize, b: usize) -> u64 {
        let key = if a < b { (a, b) } else { (b, a) };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Top `n` pairs by count, ties broken by ascending pair value.
    pub fn top_pairs(&self, n: usize) -> Vec<PairCount> {
        let mut pairs: Vec<(&(usize, usize), &u64)> = self.counts.iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        pairs
            .into_iter()
            .take(n)
            .map(|(&(a, b), &count)| PairCount { a, b, count })
            .collect()
    }

    /// Connected components over the strong-edge graph.
    ///
    /// An edge exists where `count / max_count > threshold`. BFS visits
    /// node ids in ascending order, so output is deterministic: each
    /// component is ascending-sorted and the component list is ordered
    /// by first-discovered node. Components of size 1 are dropped.
    pub fn cluster(&self, threshold: f32) -> Vec<Vec<usize>> {
        if self.counts.is_empty() {
            return Vec::new();
        }
        let max = self.counts.values().copied().max().unwrap_or(1).max(1);

        let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for (&(a, b), &count) in &self.counts {
            if count as f32 / max as f32 > threshold {
                adjacency.entry(a).or_default().insert(b);
                adjacency.entry(b).or_default().insert(a);
            }
        }

        let mut clusters = Vec::new();
        let mut visited: BTreeSet<usize> = BTreeSet::new();
        for &start in adjacency.keys() {
            if visited.contains(&start) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited.insert(start);
            while let Some(node) = queue.pop_front() {
                component.push(node);
                if let Some(neighbors) = adjacency.get(&node) {
                    for &next in neighbors {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
            if component.len() >= 2 {
                component.sort_unstable();
                clusters.push(component);
            }
        }
        clusters
    }
}

/// Union of experts a token selected across all of its layers.
pub fn token_expert_union(token: &TokenRecord) -> BTreeSet<usize> {
    token
        .layers
        .iter()
        .flat_map(|layer| layer.selected_experts.iter().copied())
        .collect()
}

/// Build the co-occurrence table for a sequence of tokens.
pub fn from_tokens<'a>(tokens: impl Iterator<Item = &'a TokenRecord>) -> CoOccurrence {
    let mut table = CoOccurrence::new();
    for token in tokens {
        let union = token_expert_union(token);
        if union.len() >= 2 {
            table.record_token(&union);
        }
    }
    table
}

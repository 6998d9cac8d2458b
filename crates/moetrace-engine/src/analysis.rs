//! Cross-session aggregation and category comparison.
//!
//! Everything here is pure: it takes already-loaded artifacts and
//! produces ephemeral reports, recomputed per request. Aggregation is
//! built only from associative, commutative merges, so the output is
//! identical for any input ordering. Skipping unreadable artifacts is
//! the runtime layer's job; by the time data reaches this module it is
//! well-formed.

use std::collections::BTreeMap;

use serde::Serialize;

use moetrace_types::{
    ExpertCount, LayerHotspot, LayerSummary, MatrixEntry, PairCount, Phase, PhasedMatrix,
    PhasedUsage, SavedSession,
};

use crate::{cooccur, matrix};
use crate::cooccur::CoOccurrence;

/// Categories' top lists considered when ranking differentiators.
pub const CATEGORY_TOP_EXPERTS: usize = 10;
/// Differentiating-experts ranking cap.
pub const DIFFERENTIATOR_CAP: usize = 20;

/// Aggregate view over a set of saved sessions. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CrossSessionAnalysis {
    pub session_count: usize,
    /// Widest router seen across the aggregated sessions. Usage maps
    /// are sparse, so least-used rankings take their domain from here.
    pub num_experts: usize,
    pub usage: PhasedUsage,
    pub layer_summary: LayerSummary,
    pub clusters: Vec<Vec<usize>>,
    pub top_pairs: Vec<PairCount>,
}

/// Merged layer × expert matrix for one phase slice, with its hotspots.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    pub session_count: usize,
    pub cells: Vec<MatrixEntry>,
    pub hotspots: Vec<LayerHotspot>,
}

/// One category's aggregate profile.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryProfile {
    pub session_count: usize,
    pub top_experts: Vec<NormalizedExpertCount>,
}

/// Expert usage normalized by the category's session count, so
/// categories with different sample sizes compare fairly.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedExpertCount {
    pub expert: usize,
    pub count: u64,
    pub normalized: f32,
}

/// An expert whose usage varies strongly across categories.
#[derive(Debug, Clone, Serialize)]
pub struct DifferentiatingExpert {
    pub expert: usize,
    /// Population variance of per-category normalized usage.
    pub variance: f32,
    pub per_category: BTreeMap<String, f32>,
}

/// Category comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryComparison {
    pub per_category: BTreeMap<String, CategoryProfile>,
    pub differentiating_experts: Vec<DifferentiatingExpert>,
}

/// Sum usage, merge matrices, and recompute + merge co-occurrence from
/// each session's raw combined tokens, then cluster at `threshold`.
pub fn aggregate(sessions: &[SavedSession], threshold: f32) -> CrossSessionAnalysis {
    let mut usage = PhasedUsage::default();
    let mut merged_matrix = PhasedMatrix::default();
    let mut pairs = CoOccurrence::new();
    let mut num_experts = 0;

    for saved in sessions {
        usage.merge(&saved.session.usage);
        merged_matrix.merge(&saved.session.matrix);
        num_experts = num_experts.max(saved.session.num_experts);
        // Authoritative: derived from raw token data, not from any
        // precomputed per-session table.
        pairs.merge(&cooccur::from_tokens(saved.session.combined_tokens()));
    }

    CrossSessionAnalysis {
        session_count: sessions.len(),
        num_experts,
        usage,
        layer_summary: matrix::summarize(&merged_matrix.overall),
        clusters: pairs.cluster(threshold),
        top_pairs: pairs.top_pairs(crate::summary::TOP_PAIRS),
    }
}

/// Top `n` experts by aggregate usage, ties by ascending expert id.
pub fn most_used(analysis: &CrossSessionAnalysis, n: usize) -> Vec<ExpertCount> {
    analysis
        .usage
        .overall
        .top_n(n)
        .into_iter()
        .map(|(expert, count)| ExpertCount { expert, count })
        .collect()
}

/// Bottom `n` experts by aggregate usage over `[0, num_experts)`,
/// ties by ascending expert id. Dead experts (never selected by any
/// session) rank first with count 0.
pub fn least_used(analysis: &CrossSessionAnalysis, n: usize) -> Vec<ExpertCount> {
    analysis
        .usage
        .overall
        .bottom_n(analysis.num_experts, n)
        .into_iter()
        .map(|(expert, count)| ExpertCount { expert, count })
        .collect()
}

/// Merged matrix for one phase slice plus its hotspot ranking.
pub fn heatmap(sessions: &[SavedSession], phase: Option<Phase>) -> HeatmapView {
    let mut merged = PhasedMatrix::default();
    for saved in sessions {
        merged.merge(&saved.session.matrix);
    }
    let slice = merged.for_phase(phase).clone();
    let hotspots = matrix::summarize(&slice).hotspots;

    HeatmapView {
        phase,
        session_count: sessions.len(),
        cells: slice.into(),
        hotspots,
    }
}

/// Per-category aggregate profiles plus the differentiating-experts
/// ranking.
///
/// An expert qualifies for the ranking only when it lands in at least
/// two categories' top lists; its score is the population variance of
/// its normalized usage across all compared categories (zero where the
/// category never used it).
pub fn compare_categories(
    categorized: &BTreeMap<String, Vec<SavedSession>>,
    threshold: f32,
) -> CategoryComparison {
    let mut per_category = BTreeMap::new();
    let mut top_list_hits: BTreeMap<usize, usize> = BTreeMap::new();
    let mut normalized_usage: BTreeMap<String, BTreeMap<usize, f32>> = BTreeMap::new();

    for (category, sessions) in categorized {
        let analysis = aggregate(sessions, threshold);
        let session_count = sessions.len().max(1);

        let top_experts: Vec<NormalizedExpertCount> = analysis
            .usage
            .overall
            .top_n(CATEGORY_TOP_EXPERTS)
            .into_iter()
            .map(|(expert, count)| NormalizedExpertCount {
                expert,
                count,
                normalized: count as f32 / session_count as f32,
            })
            .collect();

        for entry in &top_experts {
            *top_list_hits.entry(entry.expert).or_insert(0) += 1;
        }
        normalized_usage.insert(
            category.clone(),
            analysis
                .usage
                .overall
                .iter()
                .map(|(expert, count)| (expert, count as f32 / session_count as f32))
                .collect(),
        );

        per_category.insert(
            category.clone(),
            CategoryProfile {
                session_count: sessions.len(),
                top_experts,
            },
        );
    }

    let mut differentiating: Vec<DifferentiatingExpert> = top_list_hits
        .iter()
        .filter(|&(_, &hits)| hits >= 2)
        .map(|(&expert, _)| {
            let values: BTreeMap<String, f32> = normalized_usage
                .iter()
                .map(|(category, usage)| {
                    (category.clone(), usage.get(&expert).copied().unwrap_or(0.0))
                })
                .collect();
            DifferentiatingExpert {
                expert,
                variance: variance(values.values().copied()),
                per_category: values,
            }
        })
        .collect();

    differentiating.sort_by(|a, b| {
        b.variance
            .partial_cmp(&a.variance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.expert.cmp(&b.expert))
    });
    differentiating.truncate(DIFFERENTIATOR_CAP);

    CategoryComparison {
        per_category,
        differentiating_experts: differentiating,
    }
}

fn variance(values: impl Iterator<Item = f32>) -> f32 {
    let values: Vec<f32> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
}

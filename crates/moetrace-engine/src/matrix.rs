//! Summarization of the sparse layer × expert matrix.
//!
//! The matrix itself (updates, merges) lives in `moetrace-types`; this
//! module turns an accumulated matrix into the per-layer profiles and
//! global hotspot ranking embedded in summaries and reports.

use std::collections::BTreeMap;

use moetrace_types::{LayerExpertMatrix, LayerExpertStat, LayerHotspot, LayerStats, LayerSummary};

/// Experts reported per layer.
pub const LAYER_TOP_EXPERTS: usize = 5;
/// Global hotspot ranking cap.
pub const HOTSPOT_CAP: usize = 20;

/// Produce per-layer stats (ascending layer order) and the global
/// hotspot list. Deterministic: ordering depends only on cell contents,
/// with all ties broken by ascending ids.
pub fn summarize(matrix: &LayerExpertMatrix) -> LayerSummary {
    let mut per_layer: BTreeMap<usize, Vec<(usize, u64, f32)>> = BTreeMap::new();
    for ((layer_index, expert), cell) in matrix.iter() {
        per_layer
            .entry(layer_index)
            .or_default()
            .push((expert, cell.count, cell.total_weight));
    }

    let layers = per_layer
        .iter()
        .map(|(&layer_index, experts)| {
            let total_activations: u64 = experts.iter().map(|&(_, count, _)| count).sum();
            let mut ranked = experts.clone();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked.truncate(LAYER_TOP_EXPERTS);

            LayerStats {
                layer_index,
                total_activations,
                distinct_experts: experts.len(),
                top_experts: ranked
                    .into_iter()
                    .map(|(expert, count, total_weight)| LayerExpertStat {
                        expert,
                        count,
                        avg_weight: if count == 0 {
                            0.0
                        } else {
                            total_weight / count as f32
                        },
                    })
                    .collect(),
            }
        })
        .collect();

    let mut hotspots: Vec<LayerHotspot> = matrix
        .iter()
        .map(|((layer_index, expert), cell)| LayerHotspot {
            layer_index,
            expert,
            count: cell.count,
            total_weight: cell.total_weight,
        })
        .collect();
    hotspots.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.layer_index.cmp(&b.layer_index))
            .then(a.expert.cmp(&b.expert))
    });
    hotspots.truncate(HOTSPOT_CAP);

    LayerSummary { layers, hotspots }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_orders_layers_and_breaks_ties_by_expert_id() {
        let mut matrix = LayerExpertMatrix::new();
        // Layer 1: expert 4 twice, experts 0 and 2 once each (tied).
        matrix.update(1, 4, 0.5);
        matrix.update(1, 4, 0.3);
        matrix.update(1, 2, 0.2);
        matrix.update(1, 0, 0.9);
        // Layer 0: single expert.
        matrix.update(0, 7, 1.0);

        let summary = summarize(&matrix);

        assert_eq!(summary.layers.len(), 2);
        assert_eq!(summary.layers[0].layer_index, 0);
        assert_eq!(summary.layers[1].layer_index, 1);
        assert_eq!(summary.layers[1].total_activations, 4);
        assert_eq!(summary.layers[1].distinct_experts, 3);

        let top: Vec<usize> = summary.layers[1]
            .top_experts
            .iter()
            .map(|s| s.expert)
            .collect();
        assert_eq!(top, vec![4, 0, 2]);
        assert!((summary.layers[1].top_experts[0].avg_weight - 0.4).abs() < 1e-6);
    }

    #[test]
    fn hotspots_rank_by_count_then_layer_then_expert() {
        let mut matrix = LayerExpertMatrix::new();
        matrix.update(3, 1, 0.1);
        matrix.update(3, 1, 0.1);
        matrix.update(0, 5, 0.2);
        matrix.update(0, 5, 0.2);
        matrix.update(2, 2, 0.3);

        let summary = summarize(&matrix);
        let order: Vec<(usize, usize)> = summary
            .hotspots
            .iter()
            .map(|h| (h.layer_index, h.expert))
            .collect();
        assert_eq!(order, vec![(0, 5), (3, 1), (2, 2)]);
    }

    #[test]
    fn hotspots_are_capped() {
        let mut matrix = LayerExpertMatrix::new();
        for layer in 0..5 {
            for expert in 0..10 {
                matrix.update(layer, expert, 0.1);
            }
        }
        assert_eq!(summarize(&matrix).hotspots.len(), HOTSPOT_CAP);
    }

    #[test]
    fn empty_matrix_summarizes_to_empty() {
        let summary = summarize(&LayerExpertMatrix::new());
        assert!(summary.layers.is_empty());
        assert!(summary.hotspots.is_empty());
    }
}

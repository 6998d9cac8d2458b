use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Phase;

/// Accumulated activations for one `(layer, expert)` cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub count: u64,
    pub total_weight: f32,
}

impl MatrixCell {
    pub fn avg_weight(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.total_weight / self.count as f32
        }
    }
}

/// Flat serialized form of one matrix cell. JSON object keys must be
/// strings, so the sparse `(layer, expert)` map round-trips through a
/// list of these entries instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub layer_index: usize,
    pub expert: usize,
    pub count: u64,
    pub total_weight: f32,
}

/// Sparse layer × expert usage/weight accumulator.
///
/// Keys are `(layer_index, expert_id)`; each cell tracks how many times
/// the expert was activated at that layer and the sum of its routing
/// weights. Updates are amortized O(1) and never scan prior entries,
/// so the structure is safe to mutate from the inference hot path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MatrixEntry>", into = "Vec<MatrixEntry>")]
pub struct LayerExpertMatrix {
    cells: BTreeMap<(usize, usize), MatrixCell>,
}

impl LayerExpertMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one activation of `expert` at `layer_index` with the
    /// given routing weight, creating the cell on demand.
    pub fn update(&mut self, layer_index: usize, expert: usize, weight: f32) {
        let cell = self.cells.entry((layer_index, expert)).or_default();
        cell.count += 1;
        cell.total_weight += weight;
    }

    /// Element-wise sum of counts and weights across matching cells.
    /// Associative and commutative, so cross-session merges are
    /// order-independent.
    pub fn merge(&mut self, other: &LayerExpertMatrix) {
        for (&key, cell) in &other.cells {
            let target = self.cells.entry(key).or_default();
            target.count += cell.count;
            target.total_weight += cell.total_weight;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Cells in ascending `(layer, expert)` order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &MatrixCell)> + '_ {
        self.cells.iter().map(|(&key, cell)| (key, cell))
    }

    pub fn get(&self, layer_index: usize, expert: usize) -> Option<&MatrixCell> {
        self.cells.get(&(layer_index, expert))
    }
}

impl From<Vec<MatrixEntry>> for LayerExpertMatrix {
    fn from(entries: Vec<MatrixEntry>) -> Self {
        let mut matrix = LayerExpertMatrix::new();
        for entry in entries {
            let cell = matrix
                .cells
                .entry((entry.layer_index, entry.expert))
                .or_default();
            cell.count += entry.count;
            cell.total_weight += entry.total_weight;
        }
        matrix
    }
}

impl From<LayerExpertMatrix> for Vec<MatrixEntry> {
    fn from(matrix: LayerExpertMatrix) -> Self {
        matrix
            .cells
            .into_iter()
            .map(|((layer_index, expert), cell)| MatrixEntry {
                layer_index,
                expert,
                count: cell.count,
                total_weight: cell.total_weight,
            })
            .collect()
    }
}

/// Layer × expert matrices split by phase, plus the combined view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhasedMatrix {
    pub overall: LayerExpertMatrix,
    pub prefill: LayerExpertMatrix,
    pub generation: LayerExpertMatrix,
}

impl PhasedMatrix {
    pub fn update(&mut self, phase: Phase, layer_index: usize, expert: usize, weight: f32) {
        self.overall.update(layer_index, expert, weight);
        match phase {
            Phase::Prefill => self.prefill.update(layer_index, expert, weight),
            Phase::Generation => self.generation.update(layer_index, expert, weight),
        }
    }

    pub fn for_phase(&self, phase: Option<Phase>) -> &LayerExpertMatrix {
        match phase {
            None => &self.overall,
            Some(Phase::Prefill) => &self.prefill,
            Some(Phase::Generation) => &self.generation,
        }
    }

    pub fn merge(&mut self, other: &PhasedMatrix) {
        self.overall.merge(&other.overall);
        self.prefill.merge(&other.prefill);
        self.generation.merge(&other.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accumulates_count_and_weight() {
        let mut matrix = LayerExpertMatrix::new();
        matrix.update(2, 5, 0.4);
        matrix.update(2, 5, 0.2);

        let cell = matrix.get(2, 5).unwrap();
        assert_eq!(cell.count, 2);
        assert!((cell.total_weight - 0.6).abs() < 1e-6);
        assert!((cell.avg_weight() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = LayerExpertMatrix::new();
        a.update(0, 1, 0.5);
        a.update(1, 2, 0.3);
        let mut b = LayerExpertMatrix::new();
        b.update(1, 2, 0.7);
        b.update(3, 0, 0.1);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.get(1, 2).unwrap().count, 2);
    }

    #[test]
    fn serde_round_trips_through_entry_list() {
        let mut matrix = LayerExpertMatrix::new();
        matrix.update(0, 3, 0.9);
        matrix.update(7, 1, 0.25);

        let json = serde_json::to_string(&matrix).unwrap();
        let back: LayerExpertMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(matrix, back);
    }
}

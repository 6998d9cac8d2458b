//! Numeric primitives for router confidence analysis.
//!
//! Everything here is pure and stateless: raw gate logits go through a
//! numerically stable softmax, and entropies are Shannon entropies in
//! nats. Routing with low entropy is concentrated (the router is
//! confident about its expert choice); entropy near `ln(num_experts)`
//! means near-uniform, undecided routing.

use moetrace_types::ExpertUsage;

/// Softmax over raw logits, subtracting the max before exponentiating
/// so large logits cannot overflow. Empty input yields empty output.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Shannon entropy `-Σ p·ln(p)` in nats. Entries with `p <= 0`
/// contribute zero; `ln(0)` is never evaluated. Empty input is 0.0.
pub fn entropy(probs: &[f32]) -> f32 {
    -probs
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.ln())
        .sum::<f32>()
}

/// Entropy of the distribution induced by normalizing usage counts.
/// Zero total usage is 0.0.
pub fn usage_entropy(usage: &ExpertUsage) -> f32 {
    let total = usage.total();
    if total == 0 {
        return 0.0;
    }
    let probs: Vec<f32> = usage.iter().map(|(_, c)| c as f32 / total as f32).collect();
    entropy(&probs)
}

use serde::{Deserialize, Serialize};

/// Inference phase a routing decision belongs to.
///
/// Prefill covers prompt processing; generation covers autoregressive
/// response production. Token indices are scoped per phase, so
/// `(token_index, phase)` identifies a token within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Prefill,
    Generation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prefill => "prefill",
            Phase::Generation => "generation",
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "prefill" => Ok(Phase::Prefill),
            "generation" => Ok(Phase::Generation),
            other => Err(format!("unknown phase: {}", other)),
        }
    }
}

/// One router decision emitted by the model instrumentation hook,
/// for one token at one layer. Ingestion input only; the recorder
/// unpacks it into [`crate::TokenRecord`]s and aggregates rather than
/// storing events verbatim.
///
/// Shape invariants (validated at ingestion, not construction):
/// - `gate_logits.len() == num_experts`
/// - `selected_experts.len() == expert_weights.len() == top_k`
/// - every selected expert id is `< num_experts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingEvent {
    pub token_index: usize,
    pub layer_index: usize,
    pub phase: Phase,
    /// Raw pre-softmax router scores, one per expert.
    pub gate_logits: Vec<f32>,
    /// Expert ids activated by the router's top-k policy.
    pub selected_experts: Vec<usize>,
    /// Routing weights aligned with `selected_experts`.
    pub expert_weights: Vec<f32>,
    /// Decoded token text, when the hook can provide it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token: Option<String>,
}

//! Synthetic routing-event generation.
//!
//! Fixtures are deterministic: the same arguments always produce the
//! same event stream, so assertions on counts and clusters are exact.

use moetrace_types::{Phase, RoutingEvent};

/// One routing event with uniform gate logits.
pub fn routing_event(
    token_index: usize,
    layer_index: usize,
    phase: Phase,
    num_experts: usize,
    selected: Vec<usize>,
) -> RoutingEvent {
    let k = selected.len();
    RoutingEvent {
        token_index,
        layer_index,
        phase,
        gate_logits: vec![0.1; num_experts],
        selected_experts: selected,
        expert_weights: vec![1.0 / k as f32; k],
        input_token: None,
    }
}

/// A session's worth of events where every token selects the same
/// expert pair at every layer, yielding one dominant co-occurrence pair.
pub fn pair_session_events(
    pair: (usize, usize),
    tokens: usize,
    layers: usize,
    num_experts: usize,
) -> Vec<RoutingEvent> {
    let mut events = Vec::new();
    for token in 0..tokens {
        for layer in 0..layers {
            events.push(routing_event(
                token,
                layer,
                Phase::Generation,
                num_experts,
                vec![pair.0, pair.1],
            ));
        }
    }
    events
}

/// Render events as the JSONL stream the ingest command consumes.
pub fn events_jsonl(events: &[RoutingEvent]) -> String {
    events
        .iter()
        .map(|e| serde_json::to_string(e).expect("routing event serializes"))
        .collect::<Vec<_>>()
        .join("\n")
}

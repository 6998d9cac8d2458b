//! The in-memory session recorder fed by the model instrumentation hook.
//!
//! Exactly one session is ever Recording per recorder instance;
//! interleaving two inference streams through one recorder would corrupt
//! token indices, so concurrent streams take separate recorders.
//! `log_routing_decision` sits on the inference hot path (once per layer
//! per token) and therefore does pure in-memory map/vec updates only:
//! no I/O, no scans over prior tokens.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use moetrace_types::{
    Error, GateLogitRecord, LayerDecision, Phase, Result, RouterSession, RoutingEvent,
    SavedSession, SessionMetadata, SessionSummary, TokenRecord, SAVED_SESSION_FORMAT_VERSION,
};

use crate::{entropy, summary};

/// Live counters for the query surface's status call.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    pub num_experts: usize,
    pub top_k: usize,
    pub prefill_tokens: usize,
    pub generation_tokens: usize,
    pub decisions_logged: usize,
    pub total_selections: u64,
    pub started_at: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Owns the one active session and keeps its aggregates current as
/// routing decisions arrive.
pub struct SessionRecorder {
    session: RouterSession,
    /// `(phase, token_index)` → position in that phase's token bucket.
    /// Rebuilt on reset, never persisted; makes find-or-create O(1).
    token_slots: HashMap<(Phase, usize), usize>,
}

impl SessionRecorder {
    pub fn new(num_experts: usize, top_k: usize, metadata: SessionMetadata) -> Self {
        Self {
            session: RouterSession::new(num_experts, top_k, metadata),
            token_slots: HashMap::new(),
        }
    }

    /// Discard the in-flight session (unsaved data is gone for good;
    /// callers wanting retention save first) and begin a fresh one.
    pub fn reset(&mut self, num_experts: usize, top_k: usize, metadata: SessionMetadata) {
        self.session = RouterSession::new(num_experts, top_k, metadata);
        self.token_slots.clear();
    }

    pub fn session(&self) -> &RouterSession {
        &self.session
    }

    /// Ingest one router decision.
    ///
    /// Fails fast on shape violations: a malformed event means the
    /// instrumentation is wired wrong, and silently coercing it would
    /// poison every downstream analysis.
    pub fn log_routing_decision(&mut self, event: RoutingEvent) -> Result<()> {
        self.validate(&event)?;

        let RoutingEvent {
            token_index,
            layer_index,
            phase,
            gate_logits,
            selected_experts,
            expert_weights,
            input_token,
        } = event;

        let decision_entropy = entropy::entropy(&entropy::softmax(&gate_logits));

        for (&expert, &weight) in selected_experts.iter().zip(&expert_weights) {
            self.session.usage.bump(phase, expert);
            self.session.matrix.update(phase, layer_index, expert, weight);
        }

        self.session.entropy_history.push(decision_entropy);
        self.session.push_gate_sample(GateLogitRecord {
            token_index,
            layer_index,
            phase,
            gate_logits,
        });

        let slot = self.find_or_create_token(token_index, phase, input_token);
        let bucket = match phase {
            Phase::Prefill => &mut self.session.prefill_tokens,
            Phase::Generation => &mut self.session.generation_tokens,
        };
        bucket[slot].layers.push(LayerDecision {
            layer_index,
            selected_experts,
            expert_weights,
            entropy: decision_entropy,
        });

        Ok(())
    }

    /// Current summary of the live session; the explicit empty summary
    /// when nothing has been logged yet.
    pub fn summary(&self) -> SessionSummary {
        summary::summarize_session(&self.session)
    }

    pub fn status(&self) -> RecorderStatus {
        RecorderStatus {
            num_experts: self.session.num_experts,
            top_k: self.session.top_k,
            prefill_tokens: self.session.prefill_tokens.len(),
            generation_tokens: self.session.generation_tokens.len(),
            decisions_logged: self.session.entropy_history.len(),
            total_selections: self.session.usage.overall.total(),
            started_at: self.session.start_time,
            agent_id: self.session.metadata.agent_id.clone(),
            category: self.session.metadata.category.clone(),
        }
    }

    /// Seal the session: stamp the end time, attach prompt/response,
    /// embed the summary. Consumes the recorder, so further logging
    /// against a sealed session is unrepresentable. Persisting the
    /// returned artifact is the caller's (runtime layer's) job.
    pub fn finish(mut self, prompt: Option<String>, response: Option<String>) -> SavedSession {
        self.session.end_time = Some(Utc::now());
        self.session.metadata.prompt = prompt;
        self.session.metadata.response = response;

        let summary = summary::summarize_session(&self.session);
        SavedSession {
            format_version: SAVED_SESSION_FORMAT_VERSION,
            start_time: self.session.start_time,
            end_time: self.session.end_time,
            summary,
            session: self.session,
        }
    }

    fn validate(&self, event: &RoutingEvent) -> Result<()> {
        let num_experts = self.session.num_experts;
        let top_k = self.session.top_k;

        if event.gate_logits.len() != num_experts {
            return Err(Error::Validation(format!(
                "expected {} gate logits, got {}",
                num_experts,
                event.gate_logits.len()
            )));
        }
        if event.selected_experts.len() != top_k || event.expert_weights.len() != top_k {
            return Err(Error::Validation(format!(
                "expected top-{} selection, got {} experts / {} weights",
                top_k,
                event.selected_experts.len(),
                event.expert_weights.len()
            )));
        }
        if let Some(&expert) = event
            .selected_experts
            .iter()
            .find(|&&expert| expert >= num_experts)
        {
            return Err(Error::Validation(format!(
                "expert id {} out of range (num_experts = {})",
                expert, num_experts
            )));
        }
        Ok(())
    }

    fn find_or_create_token(
        &mut self,
        token_index: usize,
        phase: Phase,
        input_token: Option<String>,
    ) -> usize {
        if let Some(&slot) = self.token_slots.get(&(phase, token_index)) {
            return slot;
        }
        let bucket = match phase {
            Phase::Prefill => &mut self.session.prefill_tokens,
            Phase::Generation => &mut self.session.generation_tokens,
        };
        let slot = bucket.len();
        bucket.push(TokenRecord {
            token_index,
            phase,
            layers: Vec::new(),
            input_token,
        });
        self.session.combined_order.push((phase, slot));
        self.token_slots.insert((phase, token_index), slot);
        slot
    }
}

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Phase, PhasedMatrix, PhasedUsage};

/// Ring-buffer capacity for raw gate-logit samples kept per session.
pub const GATE_LOGIT_SAMPLE_CAP: usize = 100;

/// One router decision at one layer for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDecision {
    pub layer_index: usize,
    pub selected_experts: Vec<usize>,
    pub expert_weights: Vec<f32>,
    /// Shannon entropy of the softmax-normalized gate logits, in nats.
    pub entropy: f32,
}

/// All router decisions for one token, across layers in arrival order.
///
/// Owned exclusively by the session; identified by `(token_index, phase)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_index: usize,
    pub phase: Phase,
    pub layers: Vec<LayerDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token: Option<String>,
}

/// Recent raw router output, retained for spot-checking instrumentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateLogitRecord {
    pub token_index: usize,
    pub layer_index: usize,
    pub phase: Phase,
    pub gate_logits: Vec<f32>,
}

/// Free-form context attached to a session at reset/save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Complete routing telemetry for one inference run.
///
/// Mutable only while being recorded; becomes immutable the moment it
/// is saved. Tokens live in per-phase buckets, with `combined_order`
/// preserving first-arrival order across both buckets as the combined
/// read view. Aggregates (`usage`, `matrix`, `entropy_history`) are
/// maintained incrementally by the recorder rather than derived on
/// demand, keeping ingestion O(1) per decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterSession {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Router width, fixed at reset time.
    pub num_experts: usize,
    /// Experts activated per token per layer, fixed at reset time.
    pub top_k: usize,

    pub prefill_tokens: Vec<TokenRecord>,
    pub generation_tokens: Vec<TokenRecord>,
    /// Arrival order of tokens across both phase buckets; each entry is
    /// `(phase, index-within-that-phase-bucket)`.
    #[serde(default)]
    pub combined_order: Vec<(Phase, usize)>,

    #[serde(default)]
    pub usage: PhasedUsage,
    #[serde(default)]
    pub matrix: PhasedMatrix,

    /// Per-decision router entropy in logging order. Unbounded.
    #[serde(default)]
    pub entropy_history: Vec<f32>,
    /// Most recent raw decisions, capped at [`GATE_LOGIT_SAMPLE_CAP`].
    #[serde(default)]
    pub gate_logit_sample: VecDeque<GateLogitRecord>,

    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl RouterSession {
    pub fn new(num_experts: usize, top_k: usize, metadata: SessionMetadata) -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            num_experts,
            top_k,
            prefill_tokens: Vec::new(),
            generation_tokens: Vec::new(),
            combined_order: Vec::new(),
            usage: PhasedUsage::default(),
            matrix: PhasedMatrix::default(),
            entropy_history: Vec::new(),
            gate_logit_sample: VecDeque::new(),
            metadata,
        }
    }

    pub fn tokens_for(&self, phase: Phase) -> &[TokenRecord] {
        match phase {
            Phase::Prefill => &self.prefill_tokens,
            Phase::Generation => &self.generation_tokens,
        }
    }

    pub fn token_count(&self) -> usize {
        self.prefill_tokens.len() + self.generation_tokens.len()
    }

    /// Tokens in first-arrival order across both phases (the combined
    /// read view).
    pub fn combined_tokens(&self) -> impl Iterator<Item = &TokenRecord> + '_ {
        self.combined_order.iter().map(|&(phase, idx)| match phase {
            Phase::Prefill => &self.prefill_tokens[idx],
            Phase::Generation => &self.generation_tokens[idx],
        })
    }

    /// Append a raw decision sample, evicting the oldest at capacity.
    pub fn push_gate_sample(&mut self, record: GateLogitRecord) {
        if self.gate_logit_sample.len() >= GATE_LOGIT_SAMPLE_CAP {
            self.gate_logit_sample.pop_front();
        }
        self.gate_logit_sample.push_back(record);
    }

    /// Mean per-decision router entropy, 0.0 when nothing was logged.
    pub fn mean_entropy(&self) -> f32 {
        if self.entropy_history.is_empty() {
            return 0.0;
        }
        self.entropy_history.iter().sum::<f32>() / self.entropy_history.len() as f32
    }
}

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use moetrace_engine::{RecorderStatus, SessionRecorder};
use moetrace_store::{Scope, SessionStore};
use moetrace_types::{RoutingEvent, SessionMetadata, SessionSummary};

/// Identity of a freshly persisted session.
#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    pub id: String,
    pub scope: String,
    pub token_count: usize,
}

/// One recorder bound to one store partition.
///
/// Exactly one inference stream per service instance: interleaving two
/// streams through one recorder would corrupt token grouping, so
/// concurrent inferences take separate services. Reads against
/// already-saved artifacts (the analysis service) are safe to run
/// alongside, since they never touch the live session.
pub struct RecorderService {
    recorder: SessionRecorder,
    store: Arc<dyn SessionStore>,
    scope: Scope,
}

impl RecorderService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        scope: Scope,
        num_experts: usize,
        top_k: usize,
        metadata: SessionMetadata,
    ) -> Self {
        Self {
            recorder: SessionRecorder::new(num_experts, top_k, metadata),
            store,
            scope,
        }
    }

    /// Drop the in-flight session (unsaved data is gone) and start a
    /// fresh one. Always succeeds.
    pub fn reset(&mut self, num_experts: usize, top_k: usize, metadata: SessionMetadata) {
        self.recorder.reset(num_experts, top_k, metadata);
    }

    /// Forward one routing decision from the instrumentation hook.
    pub fn log(&mut self, event: RoutingEvent) -> Result<()> {
        self.recorder
            .log_routing_decision(event)
            .context("routing event rejected")
    }

    pub fn status(&self) -> RecorderStatus {
        self.recorder.status()
    }

    pub fn summary(&self) -> SessionSummary {
        self.recorder.summary()
    }

    /// Seal and persist the current session, then begin a fresh empty
    /// one with the same expert configuration and context metadata
    /// (agent id and category carry forward; prompt and response belong
    /// to the sealed session only). The artifact is published
    /// atomically; its id comes back in the receipt.
    pub fn save(&mut self, prompt: Option<String>, response: Option<String>) -> Result<SaveReceipt> {
        let session = self.recorder.session();
        let num_experts = session.num_experts;
        let top_k = session.top_k;
        let metadata = SessionMetadata {
            agent_id: session.metadata.agent_id.clone(),
            category: session.metadata.category.clone(),
            prompt: None,
            response: None,
        };

        let sealed = std::mem::replace(
            &mut self.recorder,
            SessionRecorder::new(num_experts, top_k, metadata),
        );
        let saved = sealed.finish(prompt, response);
        let token_count = saved.summary.token_count;

        let id = self
            .store
            .put(&self.scope, &saved)
            .with_context(|| format!("failed to save session to scope {}", self.scope))?;

        Ok(SaveReceipt {
            id,
            scope: self.scope.to_string(),
            token_count,
        })
    }
}

//! Session summary computation, shared by the live `summary()` call and
//! the save path so the artifact embeds exactly what a live query would
//! have returned.

use moetrace_types::{ExpertCount, RouterSession, SessionSummary};

use crate::{cooccur, entropy, matrix};

/// Experts reported in the session-level top list.
pub const TOP_EXPERTS: usize = 10;
/// Co-occurring pairs reported in the summary.
pub const TOP_PAIRS: usize = 10;

/// Summarize a session. Zero recorded tokens yields the explicit empty
/// summary (all counts zero, lists empty, entropies 0.0), never a
/// division by zero.
pub fn summarize_session(session: &RouterSession) -> SessionSummary {
    if session.token_count() == 0 {
        return SessionSummary::default();
    }

    let top_experts = session
        .usage
        .overall
        .top_n(TOP_EXPERTS)
        .into_iter()
        .map(|(expert, count)| ExpertCount { expert, count })
        .collect();

    let pairs = cooccur::from_tokens(session.combined_tokens());

    SessionSummary {
        token_count: session.token_count(),
        prefill_token_count: session.prefill_tokens.len(),
        generation_token_count: session.generation_tokens.len(),
        total_selections: session.usage.overall.total(),
        top_experts,
        usage_entropy: entropy::usage_entropy(&session.usage.overall),
        mean_token_entropy: session.mean_entropy(),
        layer_summary: matrix::summarize(&session.matrix.overall),
        top_pairs: pairs.top_pairs(TOP_PAIRS),
    }
}

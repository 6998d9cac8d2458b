// Engine module - Core telemetry logic (recording, aggregation, analysis)
// This layer sits between the schema types and the runtime/CLI surface

pub mod analysis;
pub mod cooccur;
pub mod entropy;
pub mod matrix;
pub mod recorder;
mod summary;

pub use analysis::{
    aggregate, compare_categories, heatmap, least_used, most_used, CategoryComparison,
    CategoryProfile, CrossSessionAnalysis, DifferentiatingExpert, HeatmapView,
    NormalizedExpertCount,
};
pub use cooccur::{CoOccurrence, DEFAULT_CLUSTER_THRESHOLD};
pub use recorder::{RecorderStatus, SessionRecorder};

// Façade API - Stable public interface for the runtime/CLI layers

/// Summarize a recorded session (the same computation `SessionRecorder`
/// embeds in the artifact at save time).
pub use summary::summarize_session;

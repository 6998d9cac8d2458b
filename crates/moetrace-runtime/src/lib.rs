// Runtime module - wires the recorder, store and analyzer together.
// Per-artifact fault isolation during batch reads lives here; the
// engine below it stays pure.

mod analysis_service;
mod ingest;
mod recorder_service;

pub use analysis_service::{
    AggregateReport, AnalysisService, ClustersReport, CompareReport, HeatmapReport,
};
pub use ingest::{ingest_events, IngestStats};
pub use recorder_service::{RecorderService, SaveReceipt};

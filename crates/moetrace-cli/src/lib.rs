// NOTE: moetrace Architecture Rationale
//
// Why flat-file artifacts (not a database)?
// - A session artifact is a self-contained research record; embedding
//   the summary means a listing or a cross-session read never needs the
//   producing process alive
// - Artifacts are write-once, so there is no update path to index for
// - The store trait keeps the substrate swappable if a corpus outgrows
//   a directory of JSON files
//
// Why recompute co-occurrence at analysis time?
// - Raw per-token layer data is the source of truth; clustering is a
//   view over it, parameterized by a threshold the researcher may tune
// - Persisting pairwise tables would freeze one threshold's worth of
//   precomputation into every artifact for a marginal speedup
//
// Why one recorder per inference context?
// - Two interleaved inference streams through one recorder would corrupt
//   token grouping silently; separate instances make the failure
//   unrepresentable instead of merely discouraged

mod args;
mod commands;
pub mod config;
mod handlers;
pub mod types;

pub use args::{AnalyzeCommand, Cli, Commands, SessionCommand};
pub use commands::run;

//! Persistence for saved routing sessions.
//!
//! The storage substrate hides behind [`SessionStore`]; flat JSON files
//! (the default), an embedded KV store, or a database are
//! interchangeable without touching analysis logic. The only required
//! primitives are create-if-missing partition, write-once put,
//! list-by-recency, and get-by-id.

pub mod error;
mod fs;
mod scope;

pub use error::{Error, Result};
pub use fs::FsSessionStore;
pub use scope::Scope;

use moetrace_types::{SavedSession, SavedSessionMeta};

/// Abstract store of immutable session artifacts, partitioned by scope.
pub trait SessionStore: Send + Sync {
    /// Persist a session, returning its generated id. Artifacts are
    /// write-once; a successful put is never overwritten.
    fn put(&self, scope: &Scope, session: &SavedSession) -> Result<String>;

    /// Up to `limit` listing rows, most recent start time first.
    /// Unparseable artifacts are invisible here; they surface through
    /// `get` and are counted by batch aggregation via `list_ids`.
    fn list(&self, scope: &Scope, limit: usize) -> Result<Vec<SavedSessionMeta>>;

    /// Every artifact id in the scope, newest first, without parsing
    /// anything. Batch aggregation walks these so corrupt artifacts are
    /// seen (and counted as skipped) rather than silently hidden.
    fn list_ids(&self, scope: &Scope) -> Result<Vec<String>>;

    /// Load one artifact. `NotFound` if absent, `CorruptSnapshot` if
    /// present but unparseable.
    fn get(&self, scope: &Scope, id: &str) -> Result<SavedSession>;
}

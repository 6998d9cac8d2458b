use std::fs;
use std::path::{Path, PathBuf};

use moetrace_types::{SavedSession, SavedSessionMeta};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::{Scope, SessionStore};

// NOTE: Artifact Layout
//
// <root>/<scope>/routing_<start-ts>_<suffix>.json
//
// - One self-contained pretty-printed JSON document per session; the
//   summary is embedded so listings and cross-session reads never need
//   the producer alive.
// - The timestamp in the id is second-resolution for human sortability;
//   the random 8-hex suffix is what actually disambiguates saves that
//   land within the same second (timestamp-only ids silently collide).
// - Writes go to a dot-prefixed .tmp sibling and are published with an
//   atomic rename, so a crashed or interrupted save never leaves a
//   readable-but-truncated artifact behind.

/// Flat-file [`SessionStore`]: one JSON document per session under a
/// per-scope directory.
pub struct FsSessionStore {
    root: PathBuf,
}

impl FsSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: &Scope) -> PathBuf {
        self.root.join(scope.dir_name())
    }

    fn artifact_path(&self, scope: &Scope, id: &str) -> PathBuf {
        self.scope_dir(scope).join(format!("{}.json", id))
    }

    fn generate_id(&self, scope: &Scope, session: &SavedSession) -> String {
        loop {
            let suffix = &Uuid::new_v4().simple().to_string()[..8];
            let id = format!(
                "routing_{}_{}",
                session.start_time.format("%Y%m%dT%H%M%S"),
                suffix
            );
            // Write-once: regenerate on the (vanishing) chance of a
            // suffix collision instead of ever overwriting.
            if !self.artifact_path(scope, &id).exists() {
                return id;
            }
        }
    }
}

impl SessionStore for FsSessionStore {
    fn put(&self, scope: &Scope, session: &SavedSession) -> Result<String> {
        let dir = self.scope_dir(scope);
        fs::create_dir_all(&dir)?;

        let id = self.generate_id(scope, session);
        let path = self.artifact_path(scope, &id);
        let tmp = dir.join(format!(".{}.json.tmp", id));

        let json = serde_json::to_string_pretty(session)
            .map_err(|err| Error::Storage(std::io::Error::other(err)))?;
        fs::write(&tmp, json)?;
        // Atomic publish: the artifact appears fully written or not at all.
        fs::rename(&tmp, &path)?;

        Ok(id)
    }

    fn list(&self, scope: &Scope, limit: usize) -> Result<Vec<SavedSessionMeta>> {
        let dir = self.scope_dir(scope);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(id) = artifact_id(&path) else {
                continue;
            };
            // Unparseable artifacts are invisible to listings; a direct
            // get reports them as CorruptSnapshot.
            let Ok(contents) = fs::read_to_string(&path) else {
                continue;
            };
            if let Ok(session) = serde_json::from_str::<SavedSession>(&contents) {
                entries.push(session.meta(&id));
            }
        }

        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        Ok(entries)
    }

    fn list_ids(&self, scope: &Scope) -> Result<Vec<String>> {
        let dir = self.scope_dir(scope);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            if let Some(id) = artifact_id(&entry?.path()) {
                ids.push(id);
            }
        }
        // Ids embed the start timestamp, so lexicographic descending is
        // newest first.
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    fn get(&self, scope: &Scope, id: &str) -> Result<SavedSession> {
        let path = self.artifact_path(scope, id);
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map_err(|source| Error::CorruptSnapshot {
            id: id.to_string(),
            source,
        })
    }
}

/// Artifact id for a visible `*.json` file, ignoring tmp leftovers.
fn artifact_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    name.strip_suffix(".json").map(|id| id.to_string())
}

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use moetrace_engine::{
    aggregate, compare_categories, heatmap, CategoryComparison, CrossSessionAnalysis, HeatmapView,
};
use moetrace_store::{Error as StoreError, Scope, SessionStore};
use moetrace_types::{PairCount, Phase, SavedSession, SavedSessionMeta};

/// Cross-session aggregate plus how the batch read went.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub analysis: CrossSessionAnalysis,
    pub sessions_scanned: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapReport {
    pub view: HeatmapView,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClustersReport {
    pub session_count: usize,
    pub clusters: Vec<Vec<usize>>,
    pub top_pairs: Vec<PairCount>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub comparison: CategoryComparison,
    pub sessions_scanned: usize,
    pub skipped: usize,
}

/// Read-side service over one store partition. Only ever touches
/// already-saved, immutable artifacts, so it is safe to run while a new
/// session is being recorded.
pub struct AnalysisService {
    store: Arc<dyn SessionStore>,
    scope: Scope,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn SessionStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    pub fn list(&self, limit: usize) -> Result<Vec<SavedSessionMeta>> {
        self.store
            .list(&self.scope, limit)
            .with_context(|| format!("failed to list sessions in scope {}", self.scope))
    }

    pub fn get(&self, id: &str) -> Result<SavedSession> {
        self.store
            .get(&self.scope, id)
            .with_context(|| format!("failed to load session {}", id))
    }

    pub fn aggregate(&self, category: Option<&str>, threshold: f32) -> Result<AggregateReport> {
        let (sessions, skipped) = self.load_all(category)?;
        Ok(AggregateReport {
            sessions_scanned: sessions.len(),
            analysis: aggregate(&sessions, threshold),
            skipped,
        })
    }

    pub fn heatmap(
        &self,
        category: Option<&str>,
        phase: Option<Phase>,
    ) -> Result<HeatmapReport> {
        let (sessions, skipped) = self.load_all(category)?;
        Ok(HeatmapReport {
            view: heatmap(&sessions, phase),
            skipped,
        })
    }

    pub fn clusters(&self, category: Option<&str>, threshold: f32) -> Result<ClustersReport> {
        let (sessions, skipped) = self.load_all(category)?;
        let analysis = aggregate(&sessions, threshold);
        Ok(ClustersReport {
            session_count: sessions.len(),
            clusters: analysis.clusters,
            top_pairs: analysis.top_pairs,
            skipped,
        })
    }

    pub fn compare(&self, categories: &[String], threshold: f32) -> Result<CompareReport> {
        let (sessions, skipped) = self.load_all(None)?;

        let mut categorized: BTreeMap<String, Vec<SavedSession>> = categories
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();
        let mut scanned = 0;
        for session in sessions {
            let Some(category) = session.session.metadata.category.clone() else {
                continue;
            };
            if let Some(bucket) = categorized.get_mut(&category) {
                bucket.push(session);
                scanned += 1;
            }
        }

        Ok(CompareReport {
            comparison: compare_categories(&categorized, threshold),
            sessions_scanned: scanned,
            skipped,
        })
    }

    /// Load every artifact in the scope, optionally filtered by
    /// category. Corrupt snapshots are skipped and counted so one bad
    /// file does not abort a whole batch query; storage failures still
    /// propagate.
    fn load_all(&self, category: Option<&str>) -> Result<(Vec<SavedSession>, usize)> {
        let ids = self
            .store
            .list_ids(&self.scope)
            .with_context(|| format!("failed to scan scope {}", self.scope))?;

        let mut sessions = Vec::new();
        let mut skipped = 0;
        for id in ids {
            match self.store.get(&self.scope, &id) {
                Ok(session) => {
                    if let Some(want) = category
                        && session.session.metadata.category.as_deref() != Some(want)
                    {
                        continue;
                    }
                    sessions.push(session);
                }
                Err(StoreError::CorruptSnapshot { .. }) => skipped += 1,
                // Raced deletion between scan and read; nothing to count.
                Err(StoreError::NotFound(_)) => {}
                Err(err @ StoreError::Storage(_)) => {
                    return Err(err).with_context(|| format!("failed to load session {}", id));
                }
            }
        }
        Ok((sessions, skipped))
    }
}

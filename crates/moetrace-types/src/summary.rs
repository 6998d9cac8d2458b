use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RouterSession;

/// Artifact schema version. Readers tolerate newer artifacts by
/// ignoring unknown fields and older ones via serde defaults.
pub const SAVED_SESSION_FORMAT_VERSION: u32 = 1;

/// One expert and how often it was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertCount {
    pub expert: usize,
    pub count: u64,
}

/// Per-layer standing of one expert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerExpertStat {
    pub expert: usize,
    pub count: u64,
    pub avg_weight: f32,
}

/// Usage profile of a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    pub layer_index: usize,
    pub total_activations: u64,
    pub distinct_experts: usize,
    /// Top 5 experts at this layer; ties broken by ascending expert id.
    pub top_experts: Vec<LayerExpertStat>,
}

/// Globally hot `(layer, expert)` cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerHotspot {
    pub layer_index: usize,
    pub expert: usize,
    pub count: u64,
    pub total_weight: f32,
}

/// Per-layer profiles plus the global hotspot ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Ascending layer order.
    pub layers: Vec<LayerStats>,
    /// Count-descending, capped at 20, ties by `(layer, expert)` ascending.
    pub hotspots: Vec<LayerHotspot>,
}

/// Co-occurrence count for an unordered expert pair (`a < b`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub a: usize,
    pub b: usize,
    pub count: u64,
}

/// Derived overview of one session, computed once at save time and
/// embedded in the persisted artifact.
///
/// A session with zero logged tokens produces the explicit empty
/// summary (zero counts, empty lists, 0.0 entropies) rather than an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub token_count: usize,
    pub prefill_token_count: usize,
    pub generation_token_count: usize,
    /// Total `(token, layer, expert)` selections logged.
    pub total_selections: u64,
    pub top_experts: Vec<ExpertCount>,
    /// Shannon entropy of the aggregate usage distribution, in nats.
    pub usage_entropy: f32,
    /// Mean per-decision router entropy, in nats.
    pub mean_token_entropy: f32,
    #[serde(default)]
    pub layer_summary: LayerSummary,
    pub top_pairs: Vec<PairCount>,
}

impl SessionSummary {
    pub fn has_data(&self) -> bool {
        self.token_count > 0
    }
}

/// Immutable persisted snapshot of one recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    pub session: RouterSession,
    pub summary: SessionSummary,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

fn default_format_version() -> u32 {
    SAVED_SESSION_FORMAT_VERSION
}

/// Listing row for a persisted session; cheap to derive from an
/// artifact without holding the full token data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSessionMeta {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub token_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SavedSession {
    /// Derive the listing row for this artifact.
    pub fn meta(&self, id: &str) -> SavedSessionMeta {
        SavedSessionMeta {
            id: id.to_string(),
            start_time: self.start_time,
            end_time: self.end_time,
            token_count: self.summary.token_count,
            prompt_preview: self
                .session
                .metadata
                .prompt
                .as_deref()
                .map(preview),
            category: self.session.metadata.category.clone(),
        }
    }
}

/// First 80 chars of a prompt, whitespace-normalized, for listings.
fn preview(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= 80 {
        normalized
    } else {
        let truncated: String = normalized.chars().take(77).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_and_normalizes_whitespace() {
        assert_eq!(preview("hello\n  world"), "hello world");
        let long = "x".repeat(200);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 80);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn older_artifact_without_version_field_still_parses() {
        use crate::SessionMetadata;

        let session = RouterSession::new(4, 2, SessionMetadata::default());
        let saved = SavedSession {
            format_version: SAVED_SESSION_FORMAT_VERSION,
            start_time: session.start_time,
            end_time: None,
            summary: SessionSummary::default(),
            session,
        };

        let mut value = serde_json::to_value(&saved).unwrap();
        value.as_object_mut().unwrap().remove("format_version");
        let back: SavedSession = serde_json::from_value(value).unwrap();
        assert_eq!(back.format_version, SAVED_SESSION_FORMAT_VERSION);
    }
}

use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use moetrace_runtime::AnalysisService;
use moetrace_store::{Scope, SessionStore};

use crate::types::OutputFormat;

use super::{truncate_for_display, use_color};

pub fn handle(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let sessions = service.list(limit)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No saved sessions. Record one with 'moetrace ingest'.");
        return Ok(());
    }

    let header = format!(
        "{:<34}  {:<19}  {:>6}  {:<10}  {}",
        "ID", "START", "TOKENS", "CATEGORY", "PROMPT"
    );
    if use_color() {
        println!("{}", header.bold());
    } else {
        println!("{}", header);
    }

    for meta in sessions {
        println!(
            "{:<34}  {:<19}  {:>6}  {:<10}  {}",
            meta.id,
            format_relative_time(meta.start_time),
            meta.token_count,
            meta.category.as_deref().unwrap_or("-"),
            meta.prompt_preview
                .as_deref()
                .map(|p| truncate_for_display(p, 40))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

/// Recent timestamps read better as relative times; older ones fall
/// back to the date.
fn format_relative_time(ts: chrono::DateTime<chrono::Utc>) -> String {
    let elapsed = chrono::Utc::now() - ts;
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}

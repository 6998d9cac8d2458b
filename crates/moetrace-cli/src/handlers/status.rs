use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use moetrace_store::{Scope, SessionStore};

use crate::types::OutputFormat;

use super::use_color;

pub fn handle(
    data_dir: &Path,
    store: Arc<dyn SessionStore>,
    scope: Scope,
    format: OutputFormat,
) -> Result<()> {
    let ids = store.list_ids(&scope)?;

    if format == OutputFormat::Json {
        let doc = serde_json::json!({
            "data_dir": data_dir.display().to_string(),
            "scope": scope.to_string(),
            "session_count": ids.len(),
            "latest": ids.first(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if use_color() {
        println!("{}", "moetrace status".bold());
    } else {
        println!("moetrace status");
    }
    println!("  data dir: {}", data_dir.display());
    println!("  scope: {}", scope);
    println!("  saved sessions: {}", ids.len());
    if let Some(latest) = ids.first() {
        println!("  latest: {}", latest);
    }
    Ok(())
}

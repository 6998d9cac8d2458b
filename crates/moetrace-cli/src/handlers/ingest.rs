use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use moetrace_runtime::{ingest_events, RecorderService};
use moetrace_store::{Scope, SessionStore};
use moetrace_types::SessionMetadata;

use crate::types::OutputFormat;

use super::use_color;

#[allow(clippy::too_many_arguments)]
pub fn handle(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    events: &Path,
    num_experts: usize,
    top_k: usize,
    category: Option<String>,
    agent: Option<String>,
    prompt: Option<String>,
    response: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let file = File::open(events)
        .with_context(|| format!("failed to open events file: {}", events.display()))?;

    let metadata = SessionMetadata {
        agent_id: agent,
        category,
        prompt: None,
        response: None,
    };
    let mut service = RecorderService::new(store, scope, num_experts, top_k, metadata);

    let stats = ingest_events(&mut service, BufReader::new(file))?;
    let receipt = service.save(prompt, response)?;

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "id": receipt.id,
                "scope": receipt.scope,
                "token_count": receipt.token_count,
                "events": stats.events,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Plain => {
            if use_color() {
                println!("{} {}", "Saved".green().bold(), receipt.id);
            } else {
                println!("Saved {}", receipt.id);
            }
            println!(
                "  scope: {}  tokens: {}  events: {}",
                receipt.scope, receipt.token_count, stats.events
            );
        }
    }
    Ok(())
}

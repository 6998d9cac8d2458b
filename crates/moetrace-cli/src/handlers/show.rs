use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use moetrace_runtime::AnalysisService;
use moetrace_store::{Scope, SessionStore};
use moetrace_types::SessionSummary;

use crate::types::OutputFormat;

use super::use_color;

pub fn handle(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    id: &str,
    format: OutputFormat,
    summary_only: bool,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let saved = service.get(id)?;

    if format == OutputFormat::Json {
        if summary_only {
            println!("{}", serde_json::to_string_pretty(&saved.summary)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        return Ok(());
    }

    print_header(id);
    println!(
        "  start: {}  end: {}",
        saved.start_time.format("%Y-%m-%d %H:%M:%S"),
        saved
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    if let Some(category) = &saved.session.metadata.category {
        println!("  category: {}", category);
    }
    if !summary_only {
        println!(
            "  config: {} experts, top-{}",
            saved.session.num_experts, saved.session.top_k
        );
        println!(
            "  gate-logit samples retained: {}",
            saved.session.gate_logit_sample.len()
        );
    }
    print_summary(&saved.summary);
    Ok(())
}

fn print_header(id: &str) {
    if use_color() {
        println!("{}", id.bold());
    } else {
        println!("{}", id);
    }
}

fn print_summary(summary: &SessionSummary) {
    if !summary.has_data() {
        println!("  no routing data recorded");
        return;
    }

    println!(
        "  tokens: {} ({} prefill, {} generation)  selections: {}",
        summary.token_count,
        summary.prefill_token_count,
        summary.generation_token_count,
        summary.total_selections,
    );
    println!(
        "  usage entropy: {:.3} nats  mean router entropy: {:.3} nats",
        summary.usage_entropy, summary.mean_token_entropy,
    );

    if !summary.top_experts.is_empty() {
        let experts: Vec<String> = summary
            .top_experts
            .iter()
            .map(|e| format!("#{} ({})", e.expert, e.count))
            .collect();
        println!("  top experts: {}", experts.join(", "));
    }
    if !summary.top_pairs.is_empty() {
        let pairs: Vec<String> = summary
            .top_pairs
            .iter()
            .take(5)
            .map(|p| format!("#{}+#{} ({})", p.a, p.b, p.count))
            .collect();
        println!("  top pairs: {}", pairs.join(", "));
    }
    println!("  layers observed: {}", summary.layer_summary.layers.len());
}

use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use moetrace_engine::most_used;
use moetrace_runtime::AnalysisService;
use moetrace_store::{Scope, SessionStore};
use moetrace_types::Phase;

use crate::config::Config;
use crate::types::OutputFormat;

use super::use_color;

pub fn aggregate(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    category: Option<&str>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let report = service.aggregate(category, config.cluster_threshold)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Aggregate");
    println!(
        "  sessions: {}  skipped (corrupt): {}",
        report.sessions_scanned, report.skipped
    );
    warn_skipped(report.skipped);
    println!(
        "  total selections: {}",
        report.analysis.usage.overall.total()
    );

    let top = most_used(&report.analysis, config.top_n);
    if !top.is_empty() {
        let experts: Vec<String> = top
            .iter()
            .map(|e| format!("#{} ({})", e.expert, e.count))
            .collect();
        println!("  most used: {}", experts.join(", "));
    }
    if !report.analysis.clusters.is_empty() {
        println!("  clusters: {:?}", report.analysis.clusters);
    }
    println!(
        "  layers observed: {}",
        report.analysis.layer_summary.layers.len()
    );
    Ok(())
}

pub fn heatmap(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    category: Option<&str>,
    phase: Option<Phase>,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let report = service.heatmap(category, phase)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Layer x Expert Heatmap");
    println!(
        "  phase: {}  sessions: {}",
        phase.map(|p| p.as_str()).unwrap_or("overall"),
        report.view.session_count,
    );
    warn_skipped(report.skipped);
    if report.view.hotspots.is_empty() {
        println!("  no activations recorded");
        return Ok(());
    }
    println!("  {:<7}  {:<7}  {:>8}  {:>10}", "LAYER", "EXPERT", "COUNT", "AVG WT");
    for hotspot in &report.view.hotspots {
        let avg = if hotspot.count == 0 {
            0.0
        } else {
            hotspot.total_weight / hotspot.count as f32
        };
        println!(
            "  {:<7}  {:<7}  {:>8}  {:>10.4}",
            hotspot.layer_index, hotspot.expert, hotspot.count, avg
        );
    }
    Ok(())
}

pub fn clusters(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    category: Option<&str>,
    threshold: f32,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let report = service.clusters(category, threshold)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Expert Clusters");
    println!(
        "  sessions: {}  threshold: {}",
        report.session_count, threshold
    );
    warn_skipped(report.skipped);
    if report.clusters.is_empty() {
        println!("  no clusters above threshold");
    }
    for (i, cluster) in report.clusters.iter().enumerate() {
        let members: Vec<String> = cluster.iter().map(|e| format!("#{}", e)).collect();
        println!("  cluster {}: {}", i + 1, members.join(", "));
    }
    if !report.top_pairs.is_empty() {
        let pairs: Vec<String> = report
            .top_pairs
            .iter()
            .take(5)
            .map(|p| format!("#{}+#{} ({})", p.a, p.b, p.count))
            .collect();
        println!("  top pairs: {}", pairs.join(", "));
    }
    Ok(())
}

pub fn compare(
    store: Arc<dyn SessionStore>,
    scope: Scope,
    categories: &[String],
    threshold: f32,
    format: OutputFormat,
) -> Result<()> {
    let service = AnalysisService::new(store, scope);
    let report = service.compare(categories, threshold)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section("Category Comparison");
    println!(
        "  sessions: {}  categories: {}",
        report.sessions_scanned,
        categories.join(", ")
    );
    warn_skipped(report.skipped);

    for (category, profile) in &report.comparison.per_category {
        let experts: Vec<String> = profile
            .top_experts
            .iter()
            .take(5)
            .map(|e| format!("#{} ({:.1}/session)", e.expert, e.normalized))
            .collect();
        println!(
            "  {} ({} sessions): {}",
            category,
            profile.session_count,
            experts.join(", ")
        );
    }

    if report.comparison.differentiating_experts.is_empty() {
        println!("  no experts shared across category top lists");
    } else {
        println!("  differentiating experts (by variance):");
        for diff in report.comparison.differentiating_experts.iter().take(10) {
            println!("    #{}  variance {:.4}", diff.expert, diff.variance);
        }
    }
    Ok(())
}

fn section(title: &str) {
    if use_color() {
        println!("{}", title.bold());
    } else {
        println!("{}", title);
    }
}

/// Corrupt artifacts never abort a batch, but they are not silent either.
fn warn_skipped(skipped: usize) {
    if skipped > 0 {
        eprintln!("warning: skipped {} corrupt session artifact(s)", skipped);
    }
}

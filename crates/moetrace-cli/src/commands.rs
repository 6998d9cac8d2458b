use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use moetrace_store::{FsSessionStore, Scope, SessionStore};

use super::args::{AnalyzeCommand, Cli, Commands, SessionCommand};
use super::handlers;
use crate::config::Config;

pub fn run(cli: Cli) -> Result<()> {
    let data_dir = expand_tilde(&cli.data_dir);
    let config = Config::load_from(&data_dir.join("config.toml"))?;
    let scope = resolve_scope(cli.scope.as_deref(), &config)?;
    let store: Arc<dyn SessionStore> = Arc::new(FsSessionStore::new(data_dir.join("sessions")));
    let format = cli.format;

    match cli.command {
        Commands::Ingest {
            events,
            num_experts,
            top_k,
            category,
            agent,
            prompt,
            response,
        } => handlers::ingest::handle(
            store,
            scope,
            &events,
            num_experts,
            top_k,
            category,
            agent,
            prompt,
            response,
            format,
        ),

        Commands::Session { command } => match command {
            SessionCommand::List { limit } => handlers::list::handle(store, scope, limit, format),
            SessionCommand::Show { id } => handlers::show::handle(store, scope, &id, format, false),
            SessionCommand::Summary { id } => {
                handlers::show::handle(store, scope, &id, format, true)
            }
        },

        Commands::Analyze { command } => match command {
            AnalyzeCommand::Aggregate { category } => handlers::analyze::aggregate(
                store,
                scope,
                category.as_deref(),
                &config,
                format,
            ),
            AnalyzeCommand::Heatmap { phase, category } => handlers::analyze::heatmap(
                store,
                scope,
                category.as_deref(),
                phase.to_phase(),
                format,
            ),
            AnalyzeCommand::Clusters { threshold, category } => handlers::analyze::clusters(
                store,
                scope,
                category.as_deref(),
                threshold.unwrap_or(config.cluster_threshold),
                format,
            ),
            AnalyzeCommand::Compare { categories } => handlers::analyze::compare(
                store,
                scope,
                &categories,
                config.cluster_threshold,
                format,
            ),
        },

        Commands::Status => handlers::status::handle(&data_dir, store, scope, format),
    }
}

fn resolve_scope(flag: Option<&str>, config: &Config) -> Result<Scope> {
    let raw = flag
        .map(str::to_string)
        .or_else(|| config.default_scope.clone())
        .unwrap_or_else(|| "shared".to_string());
    raw.parse::<Scope>()
        .map_err(|err| anyhow::anyhow!(err))
        .context("invalid scope")
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

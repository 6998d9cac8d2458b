use crate::types::{OutputFormat, PhaseFilter};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moetrace")]
#[command(about = "Record and analyze MoE router telemetry", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "~/.moetrace", global = true)]
    pub data_dir: String,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Store partition: 'shared' or 'agent:<id>'. Falls back to the
    /// config file's default_scope, then 'shared'.
    #[arg(long, global = true)]
    pub scope: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a JSONL file of routing events into a new session and save it
    Ingest {
        /// One JSON routing event per line
        #[arg(long)]
        events: PathBuf,

        #[arg(long)]
        num_experts: usize,

        #[arg(long)]
        top_k: usize,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        agent: Option<String>,

        #[arg(long)]
        prompt: Option<String>,

        #[arg(long)]
        response: Option<String>,
    },

    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    Analyze {
        #[command(subcommand)]
        command: AnalyzeCommand,
    },

    /// Overview of the data directory and current scope
    Status,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List saved sessions, most recent first
    List {
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Print one saved session artifact
    Show { id: String },

    /// Print the summary embedded in a saved session
    Summary { id: String },
}

#[derive(Subcommand)]
pub enum AnalyzeCommand {
    /// Aggregate expert usage across saved sessions
    Aggregate {
        #[arg(long)]
        category: Option<String>,
    },

    /// Merged layer x expert matrix with hotspots
    Heatmap {
        #[arg(long, default_value = "overall")]
        phase: PhaseFilter,

        #[arg(long)]
        category: Option<String>,
    },

    /// Co-occurrence clusters of experts
    Clusters {
        /// Relative-frequency edge threshold; defaults from config
        #[arg(long)]
        threshold: Option<f32>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Compare expert usage across session categories
    Compare {
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<String>,
    },
}

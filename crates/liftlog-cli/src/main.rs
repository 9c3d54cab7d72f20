//! liftlog - workout volume tracker
//!
//! CLI wrapper around the liftlog aggregate engine: submit a day's workout,
//! ingest a batch of change events, and report running totals.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liftlog_core::{Engine, EngineConfig, SqliteAggregateStore, SqliteRawStore};
use tracing_subscriber::EnvFilter;

mod commands;

/// liftlog - workout volume tracker
#[derive(Parser, Debug)]
#[command(name = "liftlog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "liftlog.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record (or correct) one day's workout from a JSON file
    Submit {
        /// Path to the workout JSON ({"identity", "date", "exercises"})
        #[arg(short, long)]
        file: PathBuf,

        /// Override the identity in the file
        #[arg(long)]
        identity: Option<String>,

        /// Override the date in the file
        #[arg(long)]
        period: Option<String>,
    },

    /// Process a batch of change events from a JSON file
    Ingest {
        /// Path to the batch JSON (array of change events)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show running totals for one user
    Totals {
        /// The user to report on
        #[arg(long)]
        identity: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = if cli.config.exists() {
        EngineConfig::from_file(&cli.config)
            .with_context(|| format!("failed to load config from {}", cli.config.display()))?
    } else {
        EngineConfig::default()
    };

    let raw = SqliteRawStore::open(&config.raw_db_path)
        .with_context(|| format!("failed to open {}", config.raw_db_path.display()))?;
    let aggregates = SqliteAggregateStore::open(&config.aggregate_db_path)
        .with_context(|| format!("failed to open {}", config.aggregate_db_path.display()))?;
    let engine = Engine::new(raw, aggregates);

    match cli.command {
        Commands::Submit {
            file,
            identity,
            period,
        } => commands::submit::run(&engine, &file, identity, period),
        Commands::Ingest { file } => commands::ingest::run(&engine, &file, config.max_batch_len),
        Commands::Totals { identity } => commands::totals::run(&engine, &identity),
    }
}

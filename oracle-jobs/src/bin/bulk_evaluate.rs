//! Bulk evaluation job
//!
//! Recomputes composite score, tier and category for every stored agent
//! from the feedback and validation tables.
//!
//! **Usage:**
//! ```bash
//! bulk-evaluate [--config <file>] [--database-url <url>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use oracle_common::config::{load_toml_config, resolve_database_url};
use oracle_jobs::config::EvaluationSettings;
use oracle_jobs::services::{BulkEvaluator, ScoreEngine};
use oracle_jobs::{init_tracing, SqliteAgentStore};
use std::path::PathBuf;
use tracing::info;

/// Rescore every stored agent
#[derive(Parser, Debug)]
#[command(name = "bulk-evaluate")]
#[command(about = "Recompute reputation scores and tiers for all stored agents")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/agent-oracle/config.toml)
    #[arg(long, env = "ORACLE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage URL (overrides ORACLE_DATABASE_URL and the TOML config)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&toml_config.logging.level);

    let database_url = resolve_database_url(args.database_url.as_deref(), &toml_config)?;

    let store = SqliteAgentStore::open(&database_url)
        .await
        .context("Failed to open storage")?;

    let evaluator = BulkEvaluator::new(store, ScoreEngine::default(), EvaluationSettings::default());
    let summary = evaluator.run().await;

    info!(processed = summary.processed, write_errors = summary.write_errors, "Done");
    Ok(())
}

//! Registry sync job
//!
//! Pulls the ERC-8004 identity registry for one chain from its indexer and
//! upserts every agent into storage.
//!
//! **Usage:**
//! ```bash
//! sync-registry [base|ethereum|polygon] [START_FROM] [--config <file>] [--database-url <url>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use oracle_common::config::{load_toml_config, resolve_database_url};
use oracle_jobs::config::{ipfs_gateways, resolve_subgraph_url, SyncSettings};
use oracle_jobs::services::{MetadataResolver, SubgraphClient, SyncPipeline};
use oracle_jobs::{init_tracing, SqliteAgentStore};
use std::path::PathBuf;
use tracing::{info, warn};

/// Sync ERC-8004 agents from the chain indexer into storage
#[derive(Parser, Debug)]
#[command(name = "sync-registry")]
#[command(about = "Sync ERC-8004 registry agents from the chain indexer")]
#[command(version)]
struct Args {
    /// Chain to sync
    #[arg(default_value = "base")]
    chain: String,

    /// Resume after this agent identifier
    #[arg(default_value = "0")]
    start_from: u64,

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

    // Configuration errors end the run before any work
    let database_url = resolve_database_url(args.database_url.as_deref(), &toml_config)?;
    let subgraph_url = resolve_subgraph_url(&args.chain, &toml_config)?;

    let store = SqliteAgentStore::open(&database_url)
        .await
        .context("Failed to open storage")?;
    let indexer = SubgraphClient::new(args.chain.as_str(), subgraph_url)?;
    let resolver = MetadataResolver::with_gateways(ipfs_gateways(&toml_config))?;

    let mut pipeline = SyncPipeline::new(
        args.chain.as_str(),
        indexer,
        store,
        resolver,
        SyncSettings::default(),
    );
    let summary = pipeline.run(args.start_from).await;

    if summary.fetch_incomplete {
        warn!(
            "Indexer fetch incomplete; resume with: sync-registry {} {}",
            summary.chain, summary.last_cursor
        );
    }
    info!("Done");
    Ok(())
}

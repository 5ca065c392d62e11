//! Job configuration
//!
//! Resolves the indexer URL for a chain and carries the tunables of both
//! jobs. Defaults reproduce the production constants; tests shrink delays.

use crate::error::{JobError, JobResult};
use crate::services::metadata_resolver::DEFAULT_IPFS_GATEWAYS;
use crate::utils::RetryPolicy;
use oracle_common::config::{resolve_graph_api_key, TomlConfig};
use std::time::Duration;
use tracing::info;

/// Hosted subgraph gateway
const GRAPH_GATEWAY_URL: &str = "https://gateway.thegraph.com/api";

/// Chains with a published ERC-8004 identity subgraph
pub const SUPPORTED_CHAINS: &[(&str, &str)] = &[
    ("base", "43s9hQRurMGjuYnC1r2ZwS6xSQktbFyXMPMqGKUFJojb"),
    ("ethereum", "FV6RR6y13rsnCxBAicKuQEwDp8ioEGiNaWaZUmvr1F8k"),
    ("polygon", "9q16PZv1JudvtnCAf44cBoxg82yK9SSsFvrjCY9xnneF"),
];

/// Environment variable overriding the indexer URL of `chain`
pub fn subgraph_url_env(chain: &str) -> String {
    format!("ORACLE_SUBGRAPH_URL_{}", chain.to_uppercase())
}

/// Resolve the indexer URL for a chain
///
/// **Priority:** ENV override → TOML `[subgraph_urls]` → built-in gateway URL
/// (supported chains only, needs the gateway API key).
pub fn resolve_subgraph_url(chain: &str, toml_config: &TomlConfig) -> JobResult<String> {
    if let Ok(url) = std::env::var(subgraph_url_env(chain)) {
        if !url.trim().is_empty() {
            info!(chain = %chain, "Subgraph URL taken from {}", subgraph_url_env(chain));
            return Ok(url);
        }
    }

    if let Some(url) = toml_config.subgraph_urls.get(chain).filter(|u| !u.trim().is_empty()) {
        info!(chain = %chain, "Subgraph URL taken from TOML config");
        return Ok(url.clone());
    }

    let subgraph_id = SUPPORTED_CHAINS
        .iter()
        .find(|(name, _)| *name == chain)
        .map(|(_, id)| *id)
        .ok_or_else(|| {
            let supported: Vec<&str> = SUPPORTED_CHAINS.iter().map(|(name, _)| *name).collect();
            JobError::Config(format!(
                "Unsupported chain: {}. Use: {}",
                chain,
                supported.join(", ")
            ))
        })?;

    let api_key = resolve_graph_api_key(toml_config).ok_or_else(|| {
        JobError::Config(format!(
            "Subgraph gateway API key not configured. Set {} or graph_api_key in the TOML config",
            oracle_common::config::GRAPH_API_KEY_ENV
        ))
    })?;

    Ok(format!("{}/{}/subgraphs/id/{}", GRAPH_GATEWAY_URL, api_key, subgraph_id))
}

/// IPFS gateway prefixes: TOML list, else the public defaults
pub fn ipfs_gateways(toml_config: &TomlConfig) -> Vec<String> {
    match &toml_config.ipfs_gateways {
        Some(gateways) if !gateways.is_empty() => gateways.clone(),
        _ => DEFAULT_IPFS_GATEWAYS.iter().map(|g| g.to_string()).collect(),
    }
}

/// Registry sync tunables
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Records per indexer page
    pub page_size: usize,
    /// Records per storage write round
    pub write_batch_size: usize,
    pub fetch_retry: RetryPolicy,
    pub write_retry: RetryPolicy,
    /// Write errors tolerated before the storage connection is rebuilt
    pub reconnect_error_threshold: usize,
    /// Stored description length limit (characters)
    pub description_max_chars: usize,
    /// Log progress every this many written records
    pub progress_interval: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            write_batch_size: 100,
            fetch_retry: RetryPolicy::indexer_page(),
            write_retry: RetryPolicy::storage_write(),
            reconnect_error_threshold: 50,
            description_max_chars: 500,
            progress_interval: 500,
        }
    }
}

/// Bulk evaluation tunables
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    /// Rows per storage page (agents, events, validations)
    pub page_size: usize,
    pub read_retry: RetryPolicy,
    pub write_retry: RetryPolicy,
    /// Log progress every this many agents
    pub progress_interval: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            read_retry: RetryPolicy::new(3, Duration::from_secs(2)),
            write_retry: RetryPolicy::storage_write(),
            progress_interval: 500,
        }
    }
}

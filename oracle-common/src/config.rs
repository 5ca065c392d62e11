//! Configuration loading and database URL resolution
//!
//! Bootstrap configuration lives in a small TOML file. Every value it carries
//! can also be supplied through the environment or the command line; the
//! resolution order is:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (where one exists)

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding the storage connection URL
pub const DATABASE_URL_ENV: &str = "ORACLE_DATABASE_URL";

/// Environment variable holding The Graph gateway API key
pub const GRAPH_API_KEY_ENV: &str = "ORACLE_GRAPH_API_KEY";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Storage connection URL (e.g. `sqlite:///var/lib/agent-oracle/oracle.db`)
    #[serde(default)]
    pub database_url: Option<String>,

    /// API key for the hosted subgraph gateway
    #[serde(default)]
    pub graph_api_key: Option<String>,

    /// Per-chain indexer URL overrides
    #[serde(default)]
    pub subgraph_urls: HashMap<String, String>,

    /// Ordered IPFS gateway prefixes (each ends with `/ipfs/`)
    #[serde(default)]
    pub ipfs_gateways: Option<Vec<String>>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the TOML file: `<config_dir>/agent-oracle/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("agent-oracle").join("config.toml"))
}

/// Load the TOML bootstrap file
///
/// A missing file yields the default (empty) configuration. A file that
/// exists but cannot be read or parsed is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => return Ok(TomlConfig::default()),
    };

    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{} in {}", e, path.display())))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Resolve the storage connection URL
///
/// **Priority:** CLI → ENV → TOML. A missing URL is fatal: the jobs must not
/// start any work without storage credentials.
pub fn resolve_database_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    if let Some(url) = cli_arg.filter(|u| is_set(u)) {
        info!("Database URL taken from command line");
        return Ok(url.to_string());
    }

    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        if is_set(&url) {
            info!("Database URL taken from {}", DATABASE_URL_ENV);
            return Ok(url);
        }
    }

    if let Some(url) = toml_config.database_url.as_deref().filter(|u| is_set(u)) {
        info!("Database URL taken from TOML config");
        return Ok(url.to_string());
    }

    Err(Error::Config(format!(
        "Database URL not configured. Supply one of:\n\
         1. Command line: --database-url sqlite:///path/to/oracle.db\n\
         2. Environment: {}=sqlite:///path/to/oracle.db\n\
         3. TOML config: database_url = \"sqlite:///path/to/oracle.db\"",
        DATABASE_URL_ENV
    )))
}

/// Resolve the subgraph gateway API key (ENV → TOML)
pub fn resolve_graph_api_key(toml_config: &TomlConfig) -> Option<String> {
    std::env::var(GRAPH_API_KEY_ENV)
        .ok()
        .filter(|k| is_set(k))
        .or_else(|| toml_config.graph_api_key.clone().filter(|k| is_set(k)))
}

/// Non-empty, non-whitespace
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_toml_config(
            r#"
            database_url = "sqlite:///tmp/oracle.db"
            graph_api_key = "abc"
            ipfs_gateways = ["http://localhost:8080/ipfs/"]

            [subgraph_urls]
            base = "http://localhost:8000/subgraphs/base"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("sqlite:///tmp/oracle.db"));
        assert_eq!(config.graph_api_key.as_deref(), Some("abc"));
        assert_eq!(config.subgraph_urls["base"], "http://localhost:8000/subgraphs/base");
        assert_eq!(config.ipfs_gateways.unwrap().len(), 1);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_toml_config("").unwrap();
        assert!(config.database_url.is_none());
        assert!(config.subgraph_urls.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let result = parse_toml_config("database_url = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_is_set() {
        assert!(is_set("x"));
        assert!(!is_set(""));
        assert!(!is_set("   "));
    }
}

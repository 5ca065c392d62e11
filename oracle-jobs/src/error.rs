//! Error types for the oracle jobs
//!
//! Transient failures (`Indexer`, `Http`, `Storage`) are retried a bounded
//! number of times and then counted against the unit of work. Parse failures
//! never reach this type from the resolver; they degrade to defaults.

use thiserror::Error;

/// Job error type
#[derive(Debug, Error)]
pub enum JobError {
    /// Indexer returned an error payload or an unexpected status
    #[error("Indexer error: {0}")]
    Indexer(String),

    /// Outbound HTTP failure (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] oracle_common::Error),

    /// Malformed indexer record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;

//! oracle-jobs library interface
//!
//! Exposes the registry sync and bulk evaluation pipelines, plus the
//! services they are built from, so the binaries and integration tests can
//! drive them directly.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use crate::error::{JobError, JobResult};
pub use crate::storage::{AgentStore, SqliteAgentStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. "info") applies.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore a second install (tests may call this more than once)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

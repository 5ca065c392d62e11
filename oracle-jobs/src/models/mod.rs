//! Data models for oracle-jobs

pub mod indexer;
pub mod metadata;
pub mod summary;

pub use indexer::RawAgent;
pub use metadata::{AgentMetadata, ServiceEntry};
pub use summary::{EvaluationSummary, SyncSummary};

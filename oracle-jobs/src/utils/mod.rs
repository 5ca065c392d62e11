//! Utility modules for oracle-jobs

pub mod retry;

pub use retry::{retry_fixed, RetryPolicy};

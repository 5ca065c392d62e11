//! Closing summaries reported by the jobs

use oracle_common::Tier;
use std::collections::BTreeMap;

/// Outcome of one registry sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub chain: String,
    /// Records returned by the indexer
    pub fetched: usize,
    /// Records that could not be transformed (bad identifier)
    pub parse_errors: usize,
    /// Records written (upsert or fallback insert)
    pub synced: usize,
    /// Records whose writes were exhausted, over the whole run
    pub write_errors: usize,
    /// Times the storage connection was re-established
    pub reconnects: usize,
    /// Highest identifier seen; resume from here next run
    pub last_cursor: u64,
    /// Page fetch gave up after retries (result is partial)
    pub fetch_incomplete: bool,
    pub categories: BTreeMap<String, usize>,
}

/// Outcome of one bulk evaluation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    /// Agents scored and written back
    pub processed: usize,
    /// Agents whose write-back failed and was skipped
    pub write_errors: usize,
    /// Agents with at least one rating
    pub agents_with_feedback: usize,
    /// Agents with at least one completed validation
    pub agents_with_validations: usize,
    /// Ratings outside [0, 100] that were clamped while aggregating
    pub clamped_ratings: usize,
    /// Event table read gave up after retries (no agent was written)
    pub prepass_incomplete: bool,
    /// Agent page read gave up after retries (remaining agents untouched)
    pub scan_incomplete: bool,
    pub tiers: BTreeMap<Tier, usize>,
    pub categories: BTreeMap<String, usize>,
    pub protocols: BTreeMap<String, usize>,
}

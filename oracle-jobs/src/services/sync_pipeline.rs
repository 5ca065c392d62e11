//! Registry sync pipeline
//!
//! One run:
//! 1. Pull every agent with identifier > cursor from the chain indexer,
//!    page by page, until a short or empty page
//! 2. Resolve each agent's metadata, classify it and build its row
//! 3. Write rows in batches: upsert with retries, then one plain insert as
//!    fallback; rebuild the storage connection when write errors pile up
//!
//! Runs are rerunnable: the upsert is keyed on (agent_id, chain) and never
//! touches scoring columns of existing rows.

use crate::config::SyncSettings;
use crate::error::{JobError, JobResult};
use crate::models::{AgentMetadata, RawAgent, SyncSummary};
use crate::services::category_classifier::classify_registry_metadata;
use crate::services::metadata_resolver::MetadataResolver;
use crate::services::subgraph_client::RegistryIndexer;
use crate::storage::AgentStore;
use crate::utils::retry_fixed;
use chrono::{DateTime, Utc};
use oracle_common::{time, AgentRecord, Tier};
use tracing::{debug, error, info, warn};

/// Service names whose `endpoint` is published as an agent endpoint
const ENDPOINT_SERVICE_NAMES: &[&str] = &["web", "api", "a2a"];

/// Transform failures logged individually before going quiet
const LOGGED_PARSE_ERRORS: usize = 5;

/// Result of the indexer fetch loop
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub agents: Vec<RawAgent>,
    /// Highest identifier returned (the start cursor if nothing came back)
    pub last_cursor: u64,
    /// The loop stopped early (retries exhausted or cursor could not advance)
    pub incomplete: bool,
}

/// Registry sync for one chain
pub struct SyncPipeline<I, S> {
    chain: String,
    indexer: I,
    store: S,
    resolver: MetadataResolver,
    settings: SyncSettings,
}

impl<I: RegistryIndexer, S: AgentStore> SyncPipeline<I, S> {
    pub fn new(
        chain: impl Into<String>,
        indexer: I,
        store: S,
        resolver: MetadataResolver,
        settings: SyncSettings,
    ) -> Self {
        Self {
            chain: chain.into(),
            indexer,
            store,
            resolver,
            settings,
        }
    }

    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run fetch → transform → write once
    pub async fn run(&mut self, start_from: u64) -> SyncSummary {
        info!("{}", "=".repeat(60));
        info!(chain = %self.chain, start_from, "ERC-8004 registry sync");
        info!("{}", "=".repeat(60));

        let mut summary = SyncSummary {
            chain: self.chain.clone(),
            last_cursor: start_from,
            ..SyncSummary::default()
        };

        info!("Querying indexer for agents...");
        let fetched = self.fetch_all(start_from).await;
        summary.fetched = fetched.agents.len();
        summary.last_cursor = fetched.last_cursor;
        summary.fetch_incomplete = fetched.incomplete;
        info!(count = summary.fetched, "Found agents in indexer");

        if fetched.agents.is_empty() {
            info!("No agents to sync");
            return summary;
        }

        info!("Resolving metadata...");
        let records = self.transform_all(&fetched.agents, &mut summary).await;

        match self.store.count_agents(&self.chain).await {
            Ok(existing) => info!(chain = %self.chain, existing, "Agents already stored"),
            Err(e) => warn!(chain = %self.chain, error = %e, "Could not count stored agents"),
        }

        info!(count = records.len(), "Writing agents to storage...");
        self.write_records(&records, &mut summary).await;

        log_summary(&summary);
        summary
    }

    /// Page through the indexer starting after `start_from`
    ///
    /// Each page is retried per `fetch_retry`; when retries are exhausted
    /// the loop stops and returns what it has.
    pub async fn fetch_all(&self, start_from: u64) -> FetchOutcome {
        let page_size = self.settings.page_size;
        let mut outcome = FetchOutcome {
            last_cursor: start_from,
            ..FetchOutcome::default()
        };

        loop {
            let cursor = outcome.last_cursor;
            let page = match retry_fixed("indexer page", self.settings.fetch_retry, || {
                self.indexer.fetch_agents(cursor, page_size)
            })
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        chain = %self.chain,
                        cursor,
                        attempts = self.settings.fetch_retry.max_attempts,
                        error = %e,
                        "Indexer query failed, keeping agents fetched so far"
                    );
                    outcome.incomplete = true;
                    break;
                }
            };

            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let page_max = page.iter().filter_map(RawAgent::id).max();
            outcome.agents.extend(page);

            match page_max {
                Some(id) if id > cursor => outcome.last_cursor = id,
                _ => {
                    error!(chain = %self.chain, cursor, "Page did not advance the cursor, stopping");
                    outcome.incomplete = true;
                    break;
                }
            }

            if page_len < page_size {
                break;
            }

            info!(
                fetched = outcome.agents.len(),
                last_id = outcome.last_cursor,
                "Fetched agents from indexer..."
            );
        }

        outcome
    }

    async fn transform_all(&self, raw_agents: &[RawAgent], summary: &mut SyncSummary) -> Vec<AgentRecord> {
        let now = time::now();
        let mut records = Vec::with_capacity(raw_agents.len());

        for (i, raw) in raw_agents.iter().enumerate() {
            match self.transform(raw, now).await {
                Ok(record) => {
                    *summary.categories.entry(record.category.clone()).or_default() += 1;
                    records.push(record);
                }
                Err(e) => {
                    summary.parse_errors += 1;
                    if summary.parse_errors <= LOGGED_PARSE_ERRORS {
                        warn!(agent_id = %raw.agent_id, error = %e, "Skipping malformed agent");
                    }
                }
            }

            if (i + 1) % 1000 == 0 {
                info!("Parsed {}/{} agents...", i + 1, raw_agents.len());
            }
        }

        info!(parsed = records.len(), errors = summary.parse_errors, "Metadata resolved");
        records
    }

    /// Resolve and classify one indexer record into a row
    pub async fn transform(&self, raw: &RawAgent, now: DateTime<Utc>) -> JobResult<AgentRecord> {
        let agent_id = raw
            .id()
            .and_then(|id| i64::try_from(id).ok())
            .ok_or_else(|| JobError::Parse(format!("Invalid agentId {:?}", raw.agent_id)))?;

        let uri = raw.agent_uri.as_deref().unwrap_or_default().trim();
        let metadata = self.resolver.resolve(uri).await;

        Ok(build_agent_record(
            &self.chain,
            agent_id,
            raw,
            &metadata,
            now,
            self.settings.description_max_chars,
        ))
    }

    /// Write records in batches, counting successes and failures
    pub async fn write_records(&mut self, records: &[AgentRecord], summary: &mut SyncSummary) {
        let batch_size = self.settings.write_batch_size.max(1);
        let mut errors_since_reconnect = 0;
        let mut written = 0;

        for batch in records.chunks(batch_size) {
            for record in batch {
                if self.write_record(record).await {
                    summary.synced += 1;
                } else {
                    summary.write_errors += 1;
                    errors_since_reconnect += 1;
                }
            }
            written += batch.len();

            if written % self.settings.progress_interval.max(1) == 0 || written == records.len() {
                info!(
                    "Progress: {}/{} synced, {} errors",
                    summary.synced,
                    records.len(),
                    summary.write_errors
                );
            }

            if errors_since_reconnect > self.settings.reconnect_error_threshold {
                warn!(errors = errors_since_reconnect, "Refreshing storage connection...");
                if let Err(e) = self.store.reconnect().await {
                    error!(error = %e, "Storage reconnect failed, continuing with current connection");
                }
                summary.reconnects += 1;
                errors_since_reconnect = 0;
            }
        }
    }

    /// Upsert with retries, then one plain insert; `false` if both fail
    async fn write_record(&self, record: &AgentRecord) -> bool {
        let upsert = retry_fixed("agent upsert", self.settings.write_retry, || {
            self.store.upsert_agent(record)
        })
        .await;

        if upsert.is_ok() {
            return true;
        }

        match self.store.insert_agent(record).await {
            Ok(()) => {
                debug!(agent_id = record.agent_id, "Agent written by fallback insert");
                true
            }
            Err(e) => {
                warn!(agent_id = record.agent_id, chain = %record.chain, error = %e, "Agent write failed");
                false
            }
        }
    }
}

/// Build the row for one agent from its indexer record and metadata
///
/// Scoring fields start at zero / unranked. Missing indexer timestamps
/// default to `now`.
pub fn build_agent_record(
    chain: &str,
    agent_id: i64,
    raw: &RawAgent,
    metadata: &AgentMetadata,
    now: DateTime<Utc>,
    description_max_chars: usize,
) -> AgentRecord {
    let uri = raw.agent_uri.as_deref().unwrap_or_default().trim();
    let agent_uri = if uri.is_empty() {
        format!("erc8004:{}:{}", chain, agent_id)
    } else {
        uri.to_string()
    };

    let description = metadata
        .description()
        .filter(|d| !d.is_empty())
        .map(|d| d.chars().take(description_max_chars).collect::<String>());

    let endpoints = metadata
        .services()
        .into_iter()
        .filter(|svc| {
            svc.name
                .as_deref()
                .map_or(false, |name| ENDPOINT_SERVICE_NAMES.contains(&name))
        })
        .map(|svc| svc.endpoint.unwrap_or_default())
        .collect();

    AgentRecord {
        agent_id,
        chain: chain.to_string(),
        owner_address: raw.owner.as_deref().unwrap_or_default().to_lowercase(),
        agent_uri,
        name: metadata.name().map(str::to_string),
        description,
        category: classify_registry_metadata(metadata).as_str().to_string(),
        image_url: metadata.image().map(str::to_string),
        endpoints,
        registered_at: time::from_unix_seconds(raw.created_at_secs()).unwrap_or(now),
        updated_at: time::from_unix_seconds(raw.updated_at_secs()).unwrap_or(now),
        total_feedback: 0,
        average_rating: 0.0,
        composite_score: 0.0,
        validation_success_rate: 0.0,
        tier: Tier::Unranked,
    }
}

fn log_summary(summary: &SyncSummary) {
    info!("{}", "=".repeat(60));
    info!("ERC-8004 registry sync complete ({}):", summary.chain);
    info!("  Total in indexer: {}", summary.fetched);
    info!("  Parse errors:     {}", summary.parse_errors);
    info!("  Synced:           {}", summary.synced);
    info!("  Write errors:     {}", summary.write_errors);
    info!("  Reconnects:       {}", summary.reconnects);
    info!("  Resume cursor:    {}", summary.last_cursor);
    if summary.fetch_incomplete {
        warn!("  Indexer fetch stopped early; rerun from the resume cursor");
    }
    info!("  Categories: {:?}", summary.categories);
    info!("{}", "=".repeat(60));
}

//! Shared fixtures for oracle-jobs integration tests
//!
//! - Temporary SQLite stores
//! - A scripted registry indexer
//! - A scripted in-memory store with failure switches
//! - A local HTTP server for metadata hosts and IPFS gateways

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use oracle_common::{
    AgentRecord, Error, ReputationEvent, Result, ScoreUpdate, StoredAgent, ValidationRecord,
};
use oracle_jobs::config::{EvaluationSettings, SyncSettings};
use oracle_jobs::models::RawAgent;
use oracle_jobs::services::RegistryIndexer;
use oracle_jobs::storage::{AgentStore, SqliteAgentStore};
use oracle_jobs::utils::RetryPolicy;
use oracle_jobs::{JobError, JobResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Retry policy without sleeps
pub fn no_delay(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::ZERO)
}

pub fn fast_sync_settings(page_size: usize) -> SyncSettings {
    SyncSettings {
        page_size,
        fetch_retry: no_delay(3),
        write_retry: no_delay(3),
        ..SyncSettings::default()
    }
}

pub fn fast_evaluation_settings(page_size: usize) -> EvaluationSettings {
    EvaluationSettings {
        page_size,
        read_retry: no_delay(3),
        write_retry: no_delay(3),
        ..EvaluationSettings::default()
    }
}

/// SQLite store in a temporary directory (kept alive by the returned guard)
pub async fn temp_store() -> (TempDir, SqliteAgentStore) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("oracle.db").display());
    let store = SqliteAgentStore::open(&url).await.unwrap();
    (dir, store)
}

/// `data:` URI carrying `value` as base64 JSON
pub fn inline_uri(value: serde_json::Value) -> String {
    format!("data:application/json;base64,{}", STANDARD.encode(value.to_string()))
}

/// Indexer record with inline metadata naming the agent
pub fn raw_agent(id: u64) -> RawAgent {
    RawAgent {
        agent_id: id.to_string(),
        owner: Some(format!("0xOWNER{:04X}", id)),
        agent_uri: Some(inline_uri(serde_json::json!({
            "name": format!("Agent {}", id),
            "description": "Automated market maker with deep liquidity",
        }))),
        created_at: Some("1735689600".to_string()),
        updated_at: Some("1735776000".to_string()),
    }
}

/// Serves agents with identifier > cursor, optionally failing every call
/// from a given one. Records without a numeric identifier are always served.
pub struct ScriptedIndexer {
    agents: Vec<RawAgent>,
    fail_from_call: Option<usize>,
    calls: Mutex<Vec<(u64, usize)>>,
}

impl ScriptedIndexer {
    pub fn with_agents(agents: Vec<RawAgent>) -> Self {
        Self {
            agents,
            fail_from_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn sequential(total: u64) -> Self {
        Self::with_agents((1..=total).map(raw_agent).collect())
    }

    /// Fail every call with index >= `call` (0-based)
    pub fn failing_from(mut self, call: usize) -> Self {
        self.fail_from_call = Some(call);
        self
    }

    /// (after, first) of every call made
    pub fn calls(&self) -> Vec<(u64, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryIndexer for ScriptedIndexer {
    async fn fetch_agents(&self, after: u64, first: usize) -> JobResult<Vec<RawAgent>> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((after, first));
            calls.len() - 1
        };

        if matches!(self.fail_from_call, Some(n) if call_index >= n) {
            return Err(JobError::Indexer("indexer unavailable".to_string()));
        }

        Ok(self
            .agents
            .iter()
            .filter(|a| a.id().map_or(true, |id| id > after))
            .take(first)
            .cloned()
            .collect())
    }
}

/// In-memory store with failure switches and call counters
#[derive(Default)]
pub struct ScriptedStore {
    pub agents: Mutex<BTreeMap<(i64, String), AgentRecord>>,
    pub events: Vec<ReputationEvent>,
    pub validations: Vec<ValidationRecord>,
    pub fail_upserts: bool,
    pub fail_inserts: bool,
    pub fail_reputation_reads: bool,
    pub fail_agent_reads: bool,
    pub fail_score_updates_for: HashSet<i64>,
    pub upsert_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
    pub reconnects: AtomicUsize,
    pub score_updates: Mutex<Vec<ScoreUpdate>>,
}

impl ScriptedStore {
    pub fn with_agents(records: Vec<AgentRecord>) -> Self {
        let store = Self::default();
        {
            let mut agents = store.agents.lock().unwrap();
            for record in records {
                agents.insert((record.agent_id, record.chain.clone()), record);
            }
        }
        store
    }

    pub fn agent_count(&self) -> usize {
        self.agents.lock().unwrap().len()
    }
}

fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl AgentStore for ScriptedStore {
    async fn upsert_agent(&self, agent: &AgentRecord) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts {
            return Err(Error::Internal("upsert rejected".to_string()));
        }
        self.agents
            .lock()
            .unwrap()
            .insert((agent.agent_id, agent.chain.clone()), agent.clone());
        Ok(())
    }

    async fn insert_agent(&self, agent: &AgentRecord) -> Result<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts {
            return Err(Error::Internal("insert rejected".to_string()));
        }
        self.agents
            .lock()
            .unwrap()
            .insert((agent.agent_id, agent.chain.clone()), agent.clone());
        Ok(())
    }

    async fn count_agents(&self, chain: &str) -> Result<i64> {
        let agents = self.agents.lock().unwrap();
        Ok(agents.keys().filter(|(_, c)| c == chain).count() as i64)
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_agents_page(&self, offset: usize, limit: usize) -> Result<Vec<StoredAgent>> {
        if self.fail_agent_reads {
            return Err(Error::Internal("agent read failed".to_string()));
        }
        let agents = self.agents.lock().unwrap();
        Ok(agents
            .values()
            .skip(offset)
            .take(limit)
            .map(|a| StoredAgent {
                agent_id: a.agent_id,
                chain: a.chain.clone(),
                agent_uri: a.agent_uri.clone(),
                name: a.name.clone(),
                description: a.description.clone(),
                registered_at: Some(a.registered_at.to_rfc3339()),
            })
            .collect())
    }

    async fn fetch_reputation_page(&self, offset: usize, limit: usize) -> Result<Vec<ReputationEvent>> {
        if self.fail_reputation_reads {
            return Err(Error::Internal("reputation read failed".to_string()));
        }
        Ok(page(&self.events, offset, limit))
    }

    async fn fetch_validation_page(&self, offset: usize, limit: usize) -> Result<Vec<ValidationRecord>> {
        let completed: Vec<ValidationRecord> =
            self.validations.iter().filter(|v| v.is_valid.is_some()).cloned().collect();
        Ok(page(&completed, offset, limit))
    }

    async fn update_agent_scores(&self, update: &ScoreUpdate) -> Result<()> {
        if self.fail_score_updates_for.contains(&update.agent_id) {
            return Err(Error::Internal("score write rejected".to_string()));
        }
        self.score_updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port; returns the base URL
pub async fn spawn_http_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

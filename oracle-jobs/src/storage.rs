//! Storage seam for the jobs
//!
//! Both pipelines talk to storage only through [`AgentStore`], so a degraded
//! connection can be replaced mid-run and tests can script failures.

use async_trait::async_trait;
use oracle_common::db;
use oracle_common::{AgentRecord, ReputationEvent, Result, ScoreUpdate, StoredAgent, ValidationRecord};
use sqlx::SqlitePool;
use tracing::info;

/// Keyed agent store plus read access to the two event tables
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Insert, or refresh identity/metadata columns of an existing row
    async fn upsert_agent(&self, agent: &AgentRecord) -> Result<()>;

    /// Plain insert of the full record
    async fn insert_agent(&self, agent: &AgentRecord) -> Result<()>;

    async fn count_agents(&self, chain: &str) -> Result<i64>;

    /// Drop the current connection and open a fresh one
    async fn reconnect(&mut self) -> Result<()>;

    async fn fetch_agents_page(&self, offset: usize, limit: usize) -> Result<Vec<StoredAgent>>;

    async fn fetch_reputation_page(&self, offset: usize, limit: usize) -> Result<Vec<ReputationEvent>>;

    /// Completed validations only
    async fn fetch_validation_page(&self, offset: usize, limit: usize) -> Result<Vec<ValidationRecord>>;

    async fn update_agent_scores(&self, update: &ScoreUpdate) -> Result<()>;
}

/// SQLite-backed store
pub struct SqliteAgentStore {
    database_url: String,
    pool: SqlitePool,
}

impl SqliteAgentStore {
    /// Open the database (creating tables if needed)
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = db::init_database(database_url).await?;
        Ok(Self {
            database_url: database_url.to_string(),
            pool,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AgentStore for SqliteAgentStore {
    async fn upsert_agent(&self, agent: &AgentRecord) -> Result<()> {
        db::upsert_agent(&self.pool, agent).await
    }

    async fn insert_agent(&self, agent: &AgentRecord) -> Result<()> {
        db::insert_agent(&self.pool, agent).await
    }

    async fn count_agents(&self, chain: &str) -> Result<i64> {
        db::count_agents_for_chain(&self.pool, chain).await
    }

    async fn reconnect(&mut self) -> Result<()> {
        let pool = db::connect(&self.database_url).await?;
        let old = std::mem::replace(&mut self.pool, pool);
        old.close().await;
        info!("Storage connection re-established");
        Ok(())
    }

    async fn fetch_agents_page(&self, offset: usize, limit: usize) -> Result<Vec<StoredAgent>> {
        db::fetch_agents_page(&self.pool, offset as i64, limit as i64).await
    }

    async fn fetch_reputation_page(&self, offset: usize, limit: usize) -> Result<Vec<ReputationEvent>> {
        db::fetch_reputation_page(&self.pool, offset as i64, limit as i64).await
    }

    async fn fetch_validation_page(&self, offset: usize, limit: usize) -> Result<Vec<ValidationRecord>> {
        db::fetch_validation_page(&self.pool, offset as i64, limit as i64).await
    }

    async fn update_agent_scores(&self, update: &ScoreUpdate) -> Result<()> {
        db::update_agent_scores(&self.pool, update).await
    }
}

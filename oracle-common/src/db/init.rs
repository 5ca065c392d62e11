//! Database initialization
//!
//! Opens (creating if needed) the oracle database and creates the three
//! tables the jobs work on. Every statement is idempotent, so both jobs call
//! [`init_database`] on startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Connections held by a job pool; the jobs are strictly sequential
const MAX_CONNECTIONS: u32 = 4;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open a connection pool and create tables if needed
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let pool = connect(database_url).await?;

    create_agents_table(&pool).await?;
    create_reputation_events_table(&pool).await?;
    create_validation_records_table(&pool).await?;

    info!("Database ready: {}", redact_url(database_url));
    Ok(pool)
}

/// Open a pool without touching the schema
///
/// Every connection the pool opens is created if missing, runs in WAL mode
/// (so the read-serving layer is not blocked by job writes) and waits
/// [`BUSY_TIMEOUT`] on locks.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Strip query parameters (which may carry credentials) before logging
fn redact_url(database_url: &str) -> &str {
    database_url.split('?').next().unwrap_or(database_url)
}

/// Create the agents table
///
/// (agent_id, chain) is the identity of a row. Endpoints are a JSON array.
pub async fn create_agents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            agent_id INTEGER NOT NULL,
            chain TEXT NOT NULL,
            owner_address TEXT NOT NULL DEFAULT '',
            agent_uri TEXT NOT NULL DEFAULT '',
            name TEXT,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'general',
            image_url TEXT,
            endpoints TEXT NOT NULL DEFAULT '[]',
            registered_at TEXT,
            updated_at TEXT,
            total_feedback INTEGER NOT NULL DEFAULT 0,
            average_rating REAL NOT NULL DEFAULT 0,
            composite_score REAL NOT NULL DEFAULT 0,
            validation_success_rate REAL NOT NULL DEFAULT 0,
            tier TEXT NOT NULL DEFAULT 'unranked',
            PRIMARY KEY (agent_id, chain)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_agents_chain ON agents(chain)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the reputation_events table
pub async fn create_reputation_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reputation_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            agent_id INTEGER NOT NULL,
            rating REAL NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reputation_events_agent ON reputation_events(agent_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the validation_records table
///
/// `is_valid` is NULL while a validation is still pending.
pub async fn create_validation_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS validation_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            agent_id INTEGER NOT NULL,
            is_valid INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_validation_records_agent ON validation_records(agent_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

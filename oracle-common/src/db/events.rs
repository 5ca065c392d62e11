//! Reputation event and validation record operations
//!
//! Both tables are append-only and written by external collaborators; the
//! jobs only page through them. The append helpers exist for those
//! collaborators and for tests.

use crate::db::models::{ReputationEvent, ValidationRecord};
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Append one feedback rating
pub async fn append_reputation_event(pool: &SqlitePool, agent_id: i64, rating: f64) -> Result<()> {
    sqlx::query("INSERT INTO reputation_events (agent_id, rating) VALUES (?, ?)")
        .bind(agent_id)
        .bind(rating)
        .execute(pool)
        .await?;
    Ok(())
}

/// Append one validation outcome (`None` = still pending)
pub async fn append_validation_record(
    pool: &SqlitePool,
    agent_id: i64,
    is_valid: Option<bool>,
) -> Result<()> {
    sqlx::query("INSERT INTO validation_records (agent_id, is_valid) VALUES (?, ?)")
        .bind(agent_id)
        .bind(is_valid)
        .execute(pool)
        .await?;
    Ok(())
}

/// One page of reputation events in insertion order
pub async fn fetch_reputation_page(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<ReputationEvent>> {
    let rows = sqlx::query(
        "SELECT agent_id, rating FROM reputation_events ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReputationEvent {
            agent_id: row.get("agent_id"),
            rating: row.get("rating"),
        })
        .collect())
}

/// One page of completed validation records (pending ones are skipped)
pub async fn fetch_validation_page(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<ValidationRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT agent_id, is_valid FROM validation_records
        WHERE is_valid IS NOT NULL
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ValidationRecord {
            agent_id: row.get("agent_id"),
            is_valid: row.get("is_valid"),
        })
        .collect())
}

//! Agent table operations
//!
//! Rows are keyed by (agent_id, chain). Registry sync owns the identity and
//! metadata columns, bulk evaluation owns the scoring columns.

use crate::db::models::{AgentRecord, ScoreUpdate, StoredAgent, Tier};
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Insert an agent, or refresh its identity/metadata columns if it exists
///
/// Scoring columns are only written when the row is created, so re-syncing
/// never wipes scores computed by bulk evaluation.
///
/// `registered_at` keeps the earliest value seen. Registration time never
/// moves on-chain; a later value is a sync-time default standing in for a
/// missing source timestamp.
pub async fn upsert_agent(pool: &SqlitePool, agent: &AgentRecord) -> Result<()> {
    let endpoints = encode_endpoints(&agent.endpoints)?;

    sqlx::query(
        r#"
        INSERT INTO agents (
            agent_id, chain, owner_address, agent_uri, name, description, category,
            image_url, endpoints, registered_at, updated_at,
            total_feedback, average_rating, composite_score, validation_success_rate, tier
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(agent_id, chain) DO UPDATE SET
            owner_address = excluded.owner_address,
            agent_uri = excluded.agent_uri,
            name = excluded.name,
            description = excluded.description,
            category = excluded.category,
            image_url = excluded.image_url,
            endpoints = excluded.endpoints,
            registered_at = CASE
                WHEN agents.registered_at IS NULL
                  OR julianday(agents.registered_at) IS NULL
                  OR julianday(excluded.registered_at) < julianday(agents.registered_at)
                THEN excluded.registered_at
                ELSE agents.registered_at
            END,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(agent.agent_id)
    .bind(&agent.chain)
    .bind(&agent.owner_address)
    .bind(&agent.agent_uri)
    .bind(&agent.name)
    .bind(&agent.description)
    .bind(&agent.category)
    .bind(&agent.image_url)
    .bind(&endpoints)
    .bind(agent.registered_at.to_rfc3339())
    .bind(agent.updated_at.to_rfc3339())
    .bind(agent.total_feedback)
    .bind(agent.average_rating)
    .bind(agent.composite_score)
    .bind(agent.validation_success_rate)
    .bind(agent.tier.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Plain insert of the full record; fails if the key already exists
pub async fn insert_agent(pool: &SqlitePool, agent: &AgentRecord) -> Result<()> {
    let endpoints = encode_endpoints(&agent.endpoints)?;

    sqlx::query(
        r#"
        INSERT INTO agents (
            agent_id, chain, owner_address, agent_uri, name, description, category,
            image_url, endpoints, registered_at, updated_at,
            total_feedback, average_rating, composite_score, validation_success_rate, tier
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(agent.agent_id)
    .bind(&agent.chain)
    .bind(&agent.owner_address)
    .bind(&agent.agent_uri)
    .bind(&agent.name)
    .bind(&agent.description)
    .bind(&agent.category)
    .bind(&agent.image_url)
    .bind(&endpoints)
    .bind(agent.registered_at.to_rfc3339())
    .bind(agent.updated_at.to_rfc3339())
    .bind(agent.total_feedback)
    .bind(agent.average_rating)
    .bind(agent.composite_score)
    .bind(agent.validation_success_rate)
    .bind(agent.tier.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Count agents already stored for a chain
pub async fn count_agents_for_chain(pool: &SqlitePool, chain: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents WHERE chain = ?")
        .bind(chain)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load a single agent by key
pub async fn get_agent(pool: &SqlitePool, agent_id: i64, chain: &str) -> Result<Option<AgentRecord>> {
    let row = sqlx::query(
        r#"
        SELECT agent_id, chain, owner_address, agent_uri, name, description, category,
               image_url, endpoints, registered_at, updated_at,
               total_feedback, average_rating, composite_score, validation_success_rate, tier
        FROM agents
        WHERE agent_id = ? AND chain = ?
        "#,
    )
    .bind(agent_id)
    .bind(chain)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let endpoints: String = row.get("endpoints");
    let endpoints: Vec<String> = serde_json::from_str(&endpoints)
        .map_err(|e| Error::InvalidInput(format!("Malformed endpoints for agent {}: {}", agent_id, e)))?;

    let registered_at: Option<String> = row.get("registered_at");
    let updated_at: Option<String> = row.get("updated_at");
    let tier: String = row.get("tier");

    Ok(Some(AgentRecord {
        agent_id: row.get("agent_id"),
        chain: row.get("chain"),
        owner_address: row.get("owner_address"),
        agent_uri: row.get("agent_uri"),
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        image_url: row.get("image_url"),
        endpoints,
        registered_at: parse_stored_time(registered_at.as_deref(), "registered_at")?,
        updated_at: parse_stored_time(updated_at.as_deref(), "updated_at")?,
        total_feedback: row.get("total_feedback"),
        average_rating: row.get("average_rating"),
        composite_score: row.get("composite_score"),
        validation_success_rate: row.get("validation_success_rate"),
        tier: tier.parse::<Tier>()?,
    }))
}

/// One page of agents in ascending (agent_id, chain) order
pub async fn fetch_agents_page(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<StoredAgent>> {
    let rows = sqlx::query(
        r#"
        SELECT agent_id, chain, agent_uri, name, description, registered_at
        FROM agents
        ORDER BY agent_id, chain
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StoredAgent {
            agent_id: row.get("agent_id"),
            chain: row.get("chain"),
            agent_uri: row.get("agent_uri"),
            name: row.get("name"),
            description: row.get("description"),
            registered_at: row.get("registered_at"),
        })
        .collect())
}

/// Write the scoring columns of one agent
///
/// Returns `NotFound` if no row matches the key.
pub async fn update_agent_scores(pool: &SqlitePool, update: &ScoreUpdate) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE agents SET
            name = ?,
            category = ?,
            composite_score = ?,
            tier = ?,
            total_feedback = ?,
            average_rating = ?,
            validation_success_rate = ?,
            updated_at = ?
        WHERE agent_id = ? AND chain = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.category)
    .bind(update.composite_score)
    .bind(update.tier.as_str())
    .bind(update.total_feedback)
    .bind(update.average_rating)
    .bind(update.validation_success_rate)
    .bind(update.updated_at.to_rfc3339())
    .bind(update.agent_id)
    .bind(&update.chain)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "agent {} on {}",
            update.agent_id, update.chain
        )));
    }

    Ok(())
}

fn encode_endpoints(endpoints: &[String]) -> Result<String> {
    serde_json::to_string(endpoints)
        .map_err(|e| Error::Internal(format!("Failed to serialize endpoints: {}", e)))
}

fn parse_stored_time(value: Option<&str>, column: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    value
        .and_then(crate::time::parse_timestamp)
        .ok_or_else(|| Error::InvalidInput(format!("Unparsable {}: {:?}", column, value)))
}

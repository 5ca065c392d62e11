//! Row models for the agent, reputation event and validation tables

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete trust rank derived from composite score and feedback volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Unranked,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Unranked => "unranked",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Diamond => "diamond",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unranked" => Ok(Tier::Unranked),
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            "diamond" => Ok(Tier::Diamond),
            other => Err(Error::InvalidInput(format!("Unknown tier: {}", other))),
        }
    }
}

/// Full agent row as written by registry sync
///
/// Identity and metadata fields belong to the sync job; the scoring fields
/// (`total_feedback` .. `tier`) only take effect on first insert and are
/// afterwards maintained by bulk evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRecord {
    pub agent_id: i64,
    pub chain: String,
    pub owner_address: String,
    pub agent_uri: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub endpoints: Vec<String>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_feedback: i64,
    pub average_rating: f64,
    pub composite_score: f64,
    pub validation_success_rate: f64,
    pub tier: Tier,
}

/// Subset of an agent row read back by bulk evaluation
///
/// `registered_at` stays raw text; it is parsed leniently at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAgent {
    pub agent_id: i64,
    pub chain: String,
    pub agent_uri: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub registered_at: Option<String>,
}

/// Scoring write-back for one agent, keyed by (agent_id, chain)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    pub agent_id: i64,
    pub chain: String,
    pub name: Option<String>,
    pub category: String,
    pub composite_score: f64,
    pub tier: Tier,
    pub total_feedback: i64,
    pub average_rating: f64,
    pub validation_success_rate: f64,
    pub updated_at: DateTime<Utc>,
}

/// One feedback rating for an agent (append-only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationEvent {
    pub agent_id: i64,
    pub rating: f64,
}

/// One validation outcome for an agent (append-only)
///
/// `is_valid == None` means the validation has not completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRecord {
    pub agent_id: i64,
    pub is_valid: Option<bool>,
}

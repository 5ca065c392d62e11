//! # Agent Oracle Common Library
//!
//! Shared code for the oracle batch jobs including:
//! - Database schema, models and keyed queries
//! - Configuration loading (TOML bootstrap, environment, CLI overrides)
//! - Timestamp helpers
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use db::models::{AgentRecord, ReputationEvent, ScoreUpdate, StoredAgent, Tier, ValidationRecord};
pub use error::{Error, Result};

//! Registry indexer client
//!
//! Queries the ERC-8004 identity registry subgraph (The Graph) for one chain.
//! Pages are keyset-paginated on `agentId`: each request asks for up to
//! `first` agents with an identifier strictly greater than the cursor, in
//! ascending order.
//!
//! # API Reference
//! - Endpoint: `https://gateway.thegraph.com/api/<key>/subgraphs/id/<subgraph>`
//! - Transport: GraphQL over HTTP POST, JSON body `{ query, variables }`
//! - Timeout: 30 s per request

use crate::error::{JobError, JobResult};
use crate::models::RawAgent;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Timeout for each indexer query
pub const INDEXER_TIMEOUT: Duration = Duration::from_secs(30);

const AGENTS_QUERY: &str = r#"
query Agents($first: Int!, $after: BigInt!) {
  agents(
    first: $first,
    where: { agentId_gt: $after },
    orderBy: agentId,
    orderDirection: asc
  ) {
    agentId
    owner
    agentURI
    createdAt
    updatedAt
  }
}
"#;

/// Source of registry records for one chain
#[async_trait]
pub trait RegistryIndexer: Send + Sync {
    /// Up to `first` agents with identifier > `after`, ascending
    async fn fetch_agents(&self, after: u64, first: usize) -> JobResult<Vec<RawAgent>>;
}

/// GraphQL subgraph client for one chain
pub struct SubgraphClient {
    http_client: Client,
    url: String,
    chain: String,
}

impl SubgraphClient {
    pub fn new(chain: impl Into<String>, url: impl Into<String>) -> JobResult<Self> {
        let http_client = Client::builder().timeout(INDEXER_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            url: url.into(),
            chain: chain.into(),
        })
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }
}

#[async_trait]
impl RegistryIndexer for SubgraphClient {
    async fn fetch_agents(&self, after: u64, first: usize) -> JobResult<Vec<RawAgent>> {
        debug!(chain = %self.chain, after, first, "Querying subgraph");

        let body = json!({
            "query": AGENTS_QUERY,
            "variables": { "first": first, "after": after.to_string() },
        });

        let response = self.http_client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(JobError::Indexer(format!(
                "Subgraph returned {}: {}",
                status,
                truncate(&text, 200)
            )));
        }

        let payload: GraphQlResponse = response.json().await?;
        payload.into_agents()
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<AgentsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct AgentsData {
    #[serde(default)]
    agents: Vec<RawAgent>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl GraphQlResponse {
    fn into_agents(self) -> JobResult<Vec<RawAgent>> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(JobError::Indexer(messages.join("; ")));
        }
        self.data
            .map(|d| d.agents)
            .ok_or_else(|| JobError::Indexer("Response carried no data".to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

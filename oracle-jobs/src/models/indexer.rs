//! Registry records as returned by the chain indexer
//!
//! The subgraph encodes BigInt columns as decimal strings; other indexers
//! return plain numbers. Both are accepted and kept as text until the record
//! is transformed, so one malformed record never fails a whole page.

use serde::{Deserialize, Deserializer};

/// One registered agent as reported by the indexer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAgent {
    #[serde(rename = "agentId", deserialize_with = "numeric_text")]
    pub agent_id: String,

    #[serde(default)]
    pub owner: Option<String>,

    #[serde(rename = "agentURI", default)]
    pub agent_uri: Option<String>,

    #[serde(rename = "createdAt", default, deserialize_with = "optional_numeric_text")]
    pub created_at: Option<String>,

    #[serde(rename = "updatedAt", default, deserialize_with = "optional_numeric_text")]
    pub updated_at: Option<String>,
}

impl RawAgent {
    /// Registry identifier, if it parses as a non-negative integer
    pub fn id(&self) -> Option<u64> {
        self.agent_id.trim().parse().ok()
    }

    /// Registration time in unix seconds (0 when absent or unparsable)
    pub fn created_at_secs(&self) -> i64 {
        parse_seconds(self.created_at.as_deref())
    }

    /// Last update time in unix seconds (0 when absent or unparsable)
    pub fn updated_at_secs(&self) -> i64 {
        parse_seconds(self.updated_at.as_deref())
    }
}

fn parse_seconds(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericText {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl NumericText {
    fn into_text(self) -> String {
        match self {
            NumericText::Text(s) => s,
            NumericText::Signed(n) => n.to_string(),
            NumericText::Unsigned(n) => n.to_string(),
            NumericText::Float(n) => format!("{:.0}", n),
        }
    }
}

fn numeric_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NumericText::deserialize(deserializer).map(NumericText::into_text)
}

fn optional_numeric_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericText>::deserialize(deserializer).map(|v| v.map(NumericText::into_text))
}

//! Keyword category classifier
//!
//! Builds one lowercase text pool per agent and checks keyword groups in a
//! fixed order; the first group with any substring hit wins. Changing the
//! group order changes the category of agents that match several groups.

use crate::models::AgentMetadata;
use serde::Serialize;
use std::fmt;

/// Service name whose `domains`/`skills` feed the text pool
pub const DISCOVERY_PROTOCOL_MARKER: &str = "OASF";

/// Agent category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Defi,
    Gaming,
    Rwa,
    Payments,
    Data,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Defi => "defi",
            Category::Gaming => "gaming",
            Category::Rwa => "rwa",
            Category::Payments => "payments",
            Category::Data => "data",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword groups in precedence order
const KEYWORD_GROUPS: &[(Category, &[&str])] = &[
    (Category::Defi, &["defi", "swap", "yield", "trading", "liquidity", "amm", "lending"]),
    (Category::Gaming, &["game", "gaming", "npc", "nft game", "play"]),
    (Category::Rwa, &["rwa", "real world", "tokeniz", "property", "real-world"]),
    (Category::Payments, &["payment", "settle", "remit", "invoice", "pay"]),
    (Category::Data, &["data", "analyt", "index", "oracle", "pipeline", "scrape"]),
];

/// Classify free text; `General` when no group matches
pub fn classify_text(text: &str) -> Category {
    let text = text.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// Classify freshly resolved registry metadata
///
/// Pool: metadata description and name, tags, and the domains and skills of
/// services advertised under the discovery-protocol marker.
pub fn classify_registry_metadata(metadata: &AgentMetadata) -> Category {
    let mut pool = vec![
        metadata.description().unwrap_or_default().to_string(),
        metadata.str_field("name").unwrap_or_default().to_string(),
    ];
    pool.extend(metadata.tags().into_iter().map(str::to_string));

    for service in metadata.services() {
        if service.name.as_deref() == Some(DISCOVERY_PROTOCOL_MARKER) {
            pool.extend(service.domains);
            pool.extend(service.skills);
        }
    }

    classify_text(&pool.join(" "))
}

/// Classify a stored agent
///
/// Pool: metadata description, the stored description, and tags.
pub fn classify_stored_agent(metadata: &AgentMetadata, description: Option<&str>) -> Category {
    let mut pool = vec![
        metadata.description().unwrap_or_default().to_string(),
        description.unwrap_or_default().to_string(),
    ];
    pool.extend(metadata.tags().into_iter().map(str::to_string));

    classify_text(&pool.join(" "))
}

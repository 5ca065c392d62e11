//! Metadata resolver
//!
//! Turns an agent URI into its registration metadata object. Three URI
//! schemes are understood:
//! - `data:application/json;base64,<payload>` decoded in place
//! - `http://` / `https://` fetched with a 5 s timeout
//! - `ipfs://<cid>` fetched through each configured gateway in order
//!
//! Resolution never fails: every decode, transport or parse problem yields an
//! empty [`AgentMetadata`].

use crate::error::JobResult;
use crate::models::AgentMetadata;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Prefix of inline base64 JSON metadata
pub const INLINE_JSON_PREFIX: &str = "data:application/json;base64,";

/// Scheme of content-addressed metadata
pub const IPFS_SCHEME: &str = "ipfs://";

/// Timeout for each metadata fetch
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Public gateways tried in order for `ipfs://` URIs
pub const DEFAULT_IPFS_GATEWAYS: &[&str] = &[
    "https://gateway.pinata.cloud/ipfs/",
    "https://ipfs.io/ipfs/",
];

/// Padding-indifferent decoders; registries frequently drop the trailing `=`
const LENIENT_CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

/// Resolves agent URIs to metadata objects
pub struct MetadataResolver {
    http_client: Client,
    ipfs_gateways: Vec<String>,
}

impl MetadataResolver {
    /// Resolver using the default public IPFS gateways
    pub fn new() -> JobResult<Self> {
        Self::with_gateways(DEFAULT_IPFS_GATEWAYS.iter().map(|g| g.to_string()).collect())
    }

    /// Resolver using the given gateway prefixes (each ending in `/ipfs/`)
    pub fn with_gateways(ipfs_gateways: Vec<String>) -> JobResult<Self> {
        let http_client = Client::builder().timeout(METADATA_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            ipfs_gateways,
        })
    }

    pub fn ipfs_gateways(&self) -> &[String] {
        &self.ipfs_gateways
    }

    /// Resolve any supported URI; empty metadata on failure
    pub async fn resolve(&self, uri: &str) -> AgentMetadata {
        let uri = uri.trim();
        if uri.is_empty() {
            return AgentMetadata::empty();
        }

        if uri.starts_with(INLINE_JSON_PREFIX) {
            return Self::resolve_inline(uri);
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch_json(uri).await.unwrap_or_default();
        }

        if let Some(cid) = uri.strip_prefix(IPFS_SCHEME) {
            return self.fetch_from_gateways(cid).await;
        }

        debug!(uri = %uri, "Unsupported metadata URI scheme");
        AgentMetadata::empty()
    }

    /// Resolve an inline `data:` URI without any network access
    ///
    /// Any other scheme yields empty metadata.
    pub fn resolve_inline(uri: &str) -> AgentMetadata {
        uri.trim()
            .strip_prefix(INLINE_JSON_PREFIX)
            .and_then(decode_inline_json)
            .map(AgentMetadata::from_value)
            .unwrap_or_default()
    }

    async fn fetch_from_gateways(&self, cid: &str) -> AgentMetadata {
        let cid = cid.trim_start_matches('/').trim_start_matches("ipfs/");
        if cid.is_empty() {
            return AgentMetadata::empty();
        }

        for gateway in &self.ipfs_gateways {
            let url = format!("{}{}", gateway, cid);
            if let Some(metadata) = self.fetch_json(&url).await {
                return metadata;
            }
        }

        debug!(cid = %cid, gateways = self.ipfs_gateways.len(), "All IPFS gateways failed");
        AgentMetadata::empty()
    }

    /// GET a JSON document; `None` on transport error, non-success status
    /// or unparsable body
    async fn fetch_json(&self, url: &str) -> Option<AgentMetadata> {
        let response = match self.http_client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(url = %url, error = %e, "Metadata fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Metadata fetch returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(AgentMetadata::from_value(value)),
            Err(e) => {
                debug!(url = %url, error = %e, "Metadata body is not JSON");
                None
            }
        }
    }
}

/// Decode a base64 payload (padding optional) and parse it as JSON
pub fn decode_inline_json(payload: &str) -> Option<Value> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.trim_end_matches('=');

    let bytes = LENIENT_STANDARD
        .decode(cleaned)
        .or_else(|_| LENIENT_URL_SAFE.decode(cleaned))
        .map_err(|e| debug!(error = %e, "Inline metadata is not valid base64"))
        .ok()?;

    serde_json::from_slice(&bytes)
        .map_err(|e| debug!(error = %e, "Inline metadata is not valid JSON"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn inline_uri(value: &Value) -> String {
        format!("{}{}", INLINE_JSON_PREFIX, STANDARD.encode(value.to_string()))
    }

    #[test]
    fn test_inline_round_trip() {
        let doc = json!({ "name": "Swapper", "tags": ["defi"] });
        let metadata = MetadataResolver::resolve_inline(&inline_uri(&doc));
        assert_eq!(metadata.name(), Some("Swapper"));
        assert_eq!(metadata.tags(), vec!["defi"]);
    }

    #[test]
    fn test_inline_missing_padding_tolerated() {
        // {"a":1} encodes to eyJhIjoxfQ== ; drop the padding
        let metadata = MetadataResolver::resolve_inline("data:application/json;base64,eyJhIjoxfQ");
        assert_eq!(metadata.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_inline_malformed_base64_is_empty() {
        let metadata = MetadataResolver::resolve_inline("data:application/json;base64,%%%not-base64%%%");
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_inline_non_json_is_empty() {
        let uri = format!("{}{}", INLINE_JSON_PREFIX, STANDARD.encode("hello world"));
        assert!(MetadataResolver::resolve_inline(&uri).is_empty());
    }

    #[test]
    fn test_inline_non_object_is_empty() {
        assert!(MetadataResolver::resolve_inline(&inline_uri(&json!([1, 2, 3]))).is_empty());
    }

    #[test]
    fn test_resolve_inline_ignores_other_schemes() {
        assert!(MetadataResolver::resolve_inline("https://example.com/agent.json").is_empty());
        assert!(MetadataResolver::resolve_inline("").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_empty_and_unknown_schemes() {
        let resolver = MetadataResolver::new().unwrap();
        assert!(resolver.resolve("").await.is_empty());
        assert!(resolver.resolve("   ").await.is_empty());
        assert!(resolver.resolve("ar://some-arweave-id").await.is_empty());
        assert!(resolver.resolve("ipfs://").await.is_empty());
    }

    #[test]
    fn test_default_gateways() {
        let resolver = MetadataResolver::new().unwrap();
        assert_eq!(resolver.ipfs_gateways().len(), 2);
        assert!(resolver.ipfs_gateways()[0].ends_with("/ipfs/"));
    }
}

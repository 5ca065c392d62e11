//! Metadata resolution against a local HTTP server
//!
//! The server stands in for both agent-hosted metadata and IPFS gateways.

mod helpers;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use helpers::spawn_http_server;
use oracle_jobs::services::{classify_registry_metadata, Category, MetadataResolver};
use serde_json::{json, Value};

async fn agent_document() -> Json<Value> {
    Json(json!({
        "name": "RemitBot",
        "description": "Cross-border remittance",
        "image": "https://img.example/remit.png",
        "services": [
            { "name": "api", "endpoint": "https://remit.example/api" },
            { "name": "OASF", "domains": ["finance/payments"], "skills": ["remit"] }
        ]
    }))
}

async fn not_json() -> &'static str {
    "<html>definitely not json</html>"
}

async fn broken_gateway(Path(_cid): Path<String>) -> StatusCode {
    StatusCode::BAD_GATEWAY
}

async fn good_gateway(Path(cid): Path<String>) -> Result<Json<Value>, StatusCode> {
    if cid == "QmGoodCid" {
        Ok(Json(json!({ "name": "PinnedAgent", "tags": ["analytics"] })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn test_server() -> String {
    let router = Router::new()
        .route("/agent.json", get(agent_document))
        .route("/garbage.json", get(not_json))
        .route("/broken/ipfs/:cid", get(broken_gateway))
        .route("/good/ipfs/:cid", get(good_gateway));
    spawn_http_server(router).await
}

#[tokio::test]
async fn test_http_metadata() {
    let base = test_server().await;
    let resolver = MetadataResolver::new().unwrap();

    let metadata = resolver.resolve(&format!("{}/agent.json", base)).await;

    assert_eq!(metadata.name(), Some("RemitBot"));
    assert_eq!(metadata.image(), Some("https://img.example/remit.png"));
    assert_eq!(metadata.services().len(), 2);
    assert_eq!(classify_registry_metadata(&metadata), Category::Payments);
}

#[tokio::test]
async fn test_http_error_status_is_empty() {
    let base = test_server().await;
    let resolver = MetadataResolver::new().unwrap();

    assert!(resolver.resolve(&format!("{}/missing.json", base)).await.is_empty());
}

#[tokio::test]
async fn test_http_non_json_body_is_empty() {
    let base = test_server().await;
    let resolver = MetadataResolver::new().unwrap();

    assert!(resolver.resolve(&format!("{}/garbage.json", base)).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_is_empty() {
    let resolver = MetadataResolver::new().unwrap();

    assert!(resolver.resolve("http://127.0.0.1:1/agent.json").await.is_empty());
}

#[tokio::test]
async fn test_ipfs_falls_through_to_next_gateway() {
    let base = test_server().await;
    let resolver = MetadataResolver::with_gateways(vec![
        format!("{}/broken/ipfs/", base),
        format!("{}/good/ipfs/", base),
    ])
    .unwrap();

    let metadata = resolver.resolve("ipfs://QmGoodCid").await;

    assert_eq!(metadata.name(), Some("PinnedAgent"));
    assert_eq!(classify_registry_metadata(&metadata), Category::Data);
}

#[tokio::test]
async fn test_ipfs_all_gateways_fail() {
    let base = test_server().await;
    let resolver = MetadataResolver::with_gateways(vec![
        format!("{}/broken/ipfs/", base),
        format!("{}/good/ipfs/", base),
    ])
    .unwrap();

    assert!(resolver.resolve("ipfs://QmUnknownCid").await.is_empty());
}

#[tokio::test]
async fn test_inline_metadata_needs_no_network() {
    let resolver = MetadataResolver::with_gateways(Vec::new()).unwrap();
    let uri = helpers::inline_uri(json!({ "name": "Offline", "description": "Play chess" }));

    let metadata = resolver.resolve(&uri).await;

    assert_eq!(metadata.name(), Some("Offline"));
    assert_eq!(classify_registry_metadata(&metadata), Category::Gaming);
}

//! Tests for the Scryfall API client.

use std::sync::Arc;
use std::time::Duration;

use mtg_common::{CatalogError, ImageSize};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{NameMatch, ScryfallClient};
use crate::config::ResolverConfig;
use crate::governor::RateGovernor;

/// Helper: creates a minimal Scryfall card JSON value for mock responses.
fn scryfall_card_json(name: &str, set: &str, cn: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "e3285e6b-3e79-4d7c-bf96-d920f973b122",
        "name": name,
        "set": set,
        "collector_number": cn,
        "prices": { "eur": "1.50", "usd": "2.00" },
        "image_uris": { "normal": "https://example.com/image.jpg" }
    })
}

fn scryfall_error_json(code: &str, details: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "error",
        "status": 404,
        "code": code,
        "details": details
    })
}

fn client_for(server: &MockServer) -> ScryfallClient {
    let config = ResolverConfig {
        catalog_base_url: server.uri(),
        request_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    ScryfallClient::new(&config, Arc::new(RateGovernor::new(Duration::ZERO))).unwrap()
}

// ── fetch_card_by_id ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_by_id_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/e3285e6b-3e79-4d7c-bf96-d920f973b122"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scryfall_card_json(
            "Lightning Bolt",
            "lea",
            "161",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let card = client
        .fetch_card_by_id("e3285e6b-3e79-4d7c-bf96-d920f973b122")
        .await
        .unwrap();

    assert_eq!(card.name, "Lightning Bolt");
    assert_eq!(
        card.image_url(ImageSize::Normal),
        Some("https://example.com/image.jpg")
    );
}

#[tokio::test]
async fn fetch_by_id_404_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(scryfall_error_json("not_found", "No card found")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.fetch_card_by_id("missing").await {
        Err(CatalogError::NotFound { query }) => {
            assert!(query.contains("404 not_found"));
            assert!(query.contains("No card found"));
        }
        other => panic!("Expected CatalogError::NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_by_id_500_returns_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    match client.fetch_card_by_id("anything").await {
        Err(CatalogError::HttpStatus(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("Expected CatalogError::HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_returns_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.fetch_card_by_id("anything").await;
    assert!(matches!(result, Err(CatalogError::Parse(_))));
}

#[tokio::test]
async fn slow_response_returns_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(scryfall_card_json("Slow", "lea", "1"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.fetch_card_by_id("anything").await;
    assert!(
        matches!(result, Err(CatalogError::Timeout(_))),
        "got {result:?}"
    );
}

// ── fetch_card_by_set_number ─────────────────────────────────────────

#[tokio::test]
async fn fetch_by_set_number_lowercases_set_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/m10/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scryfall_card_json(
            "Test Card",
            "m10",
            "42",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let card = client.fetch_card_by_set_number("M10", "42").await.unwrap();
    assert_eq!(card.collector_number.as_deref(), Some("42"));
}

// ── fetch_card_named ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_named_exact_sends_exact_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "Lightning Bolt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scryfall_card_json(
            "Lightning Bolt",
            "lea",
            "161",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let card = client
        .fetch_card_named("Lightning Bolt", NameMatch::Exact, None)
        .await
        .unwrap();
    assert_eq!(card.name, "Lightning Bolt");
}

#[tokio::test]
async fn fetch_named_fuzzy_passes_set_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("fuzzy", "bolt"))
        .and(query_param("set", "lea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scryfall_card_json(
            "Lightning Bolt",
            "lea",
            "161",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let card = client
        .fetch_card_named("bolt", NameMatch::Fuzzy, Some("LEA"))
        .await
        .unwrap();
    assert_eq!(card.set.as_deref(), Some("lea"));
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let client = ScryfallClient::with_http(
        reqwest::Client::new(),
        "https://api.scryfall.com/",
        Arc::new(RateGovernor::new(Duration::ZERO)),
    );
    assert_eq!(client.base_url(), "https://api.scryfall.com");
}

// Integration tests (require network access)
#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn fetch_named_integration() {
    let client = ScryfallClient::new(
        &ResolverConfig::default(),
        Arc::new(RateGovernor::new(Duration::from_millis(100))),
    )
    .unwrap();

    let card = client
        .fetch_card_named("Lightning Bolt", NameMatch::Exact, None)
        .await
        .unwrap();
    assert!(card.image_url(ImageSize::Normal).is_some());
}

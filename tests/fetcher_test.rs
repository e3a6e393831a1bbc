//! Integration tests for CatalogFetcher using wiremock
//!
//! These tests validate the HTTP fetcher's retry, block and challenge
//! classification against mock servers.

use rotamap::crawler::fetcher::{CatalogFetcher, PageFetch};
use rotamap::utils::error::FetchError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(base: &str) -> CatalogFetcher {
    CatalogFetcher::with_config(base, 100, 3, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let html = r#"<html><body><a href="/shop/ap/123">A design</a></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/people/WearWink/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let body = fetcher
        .fetch_page("/people/WearWink/explore")
        .await
        .expect("fetch should succeed");

    assert!(body.contains("/shop/ap/123"));
}

#[tokio::test]
async fn test_server_error_retries_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/list").await;

    assert!(result.is_ok(), "should succeed after retries: {:?}", result.err());
}

#[tokio::test]
async fn test_blocked_status_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/list").await;

    match result {
        Err(FetchError::Blocked(403)) => {}
        other => panic!("expected Blocked(403), got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_status_is_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/list").await;

    assert!(matches!(result, Err(FetchError::Blocked(429))));
}

#[tokio::test]
async fn test_challenge_body_is_classified() {
    let mock_server = MockServer::start().await;
    let challenge = r#"<html><head><title>Attention Required! | Cloudflare</title></head>
<body>Please verify you are human.</body></html>"#;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(challenge))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/list").await;

    assert!(matches!(result, Err(FetchError::Challenge)));
}

#[tokio::test]
async fn test_empty_body_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/list").await;

    assert!(matches!(result, Err(FetchError::EmptyBody)));
}

#[tokio::test]
async fn test_not_found_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri());
    let result = fetcher.fetch_page("/gone").await;

    assert!(matches!(result, Err(FetchError::ServerError(404))));
}

#[tokio::test]
async fn test_debug_capture_writes_blocked_body() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server.uri()).with_debug_dir(dir.path());
    let _ = fetcher.fetch_page("/list").await;

    let captures: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(captures.len(), 1, "blocked body should be captured once");
}

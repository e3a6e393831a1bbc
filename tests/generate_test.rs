//! End-to-end tests for the generate run
//!
//! Drive the full discover → select → emit pipeline against a wiremock
//! catalog site with state files in a temp directory, including the
//! non-regression guarantees for blocked runs.

use chrono::NaiveDate;
use rotamap::commands::generate::{self, GenerateOptions};
use rotamap::config::Config;
use rotamap::crawler::fetcher::{CatalogFetcher, PageFetch};
use rotamap::pool::PoolStore;
use rotamap::sitemap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.discovery.explore_pages = 1;
    config.discovery.listing_pages_per_category = 1;
    config.discovery.categories = vec!["u-tees".to_string(), "all-stickers".to_string()];
    config.discovery.rate_limit = 100;
    config.discovery.max_retries = 1;
    config.discovery.request_timeout_secs = 5;
    config.selection.target_urls = 4;
    config.selection.per_category_quotas = true;
    config.storage.data_dir = dir.join("data");
    config.storage.sitemap_path = dir.join("sitemap.xml");
    config
}

fn fetcher_for(server_uri: &str) -> Arc<dyn PageFetch> {
    Arc::new(CatalogFetcher::with_config(server_uri, 100, 1, Duration::from_secs(5)).unwrap())
}

fn options_for(date: (i32, u32, u32)) -> GenerateOptions {
    GenerateOptions {
        target: None,
        skip_discovery: false,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
    }
}

fn product_links(ids: &[u64]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<a href="/i/t-shirt/Design-{id}/{id}.XYZ">design</a>"#))
        .collect();
    format!("<html><body>{links}</body></html>")
}

fn feed_locs(path: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(path).unwrap();
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("<loc>")
                .and_then(|rest| rest.strip_suffix("</loc>"))
                .map(String::from)
        })
        .collect()
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/people/WearWink/explore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_links(&[1, 2])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people/WearWink/shop"))
        .and(query_param("iaCode", "u-tees"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_links(&[3, 4])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people/WearWink/shop"))
        .and(query_param("iaCode", "all-stickers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_links(&[5, 6])))
        .mount(server)
        .await;
}

async fn mount_blocked(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_discovers_selects_and_emits() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let summary = generate::run_with_fetcher(
        &config,
        &options_for((2025, 5, 1)),
        fetcher_for(&server.uri()),
    )
    .await
    .unwrap();

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.new_locators, 6);
    assert_eq!(summary.pool_size, 6);
    assert_eq!(summary.selected, 4);
    assert!(summary.feed_written);
    assert!(!summary.blocked);

    assert_eq!(sitemap::entry_count(&config.storage.sitemap_path), 4);
    assert!(config.storage.pool_path().exists());
    assert!(config.storage.used_path().exists());

    for loc in feed_locs(&config.storage.sitemap_path) {
        assert!(loc.starts_with("https://www.redbubble.com/shop/ap/"));
    }
}

#[tokio::test]
async fn test_blocked_run_still_emits_from_pool() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    // First run populates the pool and the feed
    let catalog = MockServer::start().await;
    mount_catalog(&catalog).await;
    generate::run_with_fetcher(&config, &options_for((2025, 5, 1)), fetcher_for(&catalog.uri()))
        .await
        .unwrap();

    // Second run: the site blocks everything, but the pool still serves
    let blocked = MockServer::start().await;
    mount_blocked(&blocked).await;

    let summary = generate::run_with_fetcher(
        &config,
        &options_for((2025, 5, 2)),
        fetcher_for(&blocked.uri()),
    )
    .await
    .unwrap();

    assert!(summary.blocked);
    assert_eq!(summary.new_locators, 0);
    assert_eq!(summary.pages_failed, 3);
    assert!(summary.feed_written);
    assert_eq!(summary.selected, 4);
    assert_eq!(sitemap::entry_count(&config.storage.sitemap_path), 4);
}

#[tokio::test]
async fn test_empty_pool_and_no_prior_feed_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let blocked = MockServer::start().await;
    mount_blocked(&blocked).await;

    let result = generate::run_with_fetcher(
        &config,
        &options_for((2025, 5, 1)),
        fetcher_for(&blocked.uri()),
    )
    .await;

    let err = result.expect_err("run must fail with nothing to serve");
    assert!(err.to_string().contains("no locators available"));
}

#[tokio::test]
async fn test_empty_pool_keeps_existing_feed() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    // A previous deployment left a non-empty feed behind
    let prior = vec![
        "https://www.redbubble.com/shop/ap/900".to_string(),
        "https://www.redbubble.com/shop/ap/901".to_string(),
    ];
    sitemap::write(&config.storage.sitemap_path, &prior, chrono::Utc::now()).unwrap();

    let blocked = MockServer::start().await;
    mount_blocked(&blocked).await;

    let summary = generate::run_with_fetcher(
        &config,
        &options_for((2025, 5, 1)),
        fetcher_for(&blocked.uri()),
    )
    .await
    .unwrap();

    assert!(!summary.feed_written, "nothing selected, feed must be preserved");
    assert_eq!(summary.feed_entries, 2);
    assert_eq!(sitemap::entry_count(&config.storage.sitemap_path), 2);
    assert_eq!(feed_locs(&config.storage.sitemap_path), prior);
}

#[tokio::test]
async fn test_pool_smaller_than_target_emits_whole_pool() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.selection.per_category_quotas = false;

    let mut pool = PoolStore::new();
    pool.merge(
        vec![
            "https://www.redbubble.com/shop/ap/11".to_string(),
            "https://www.redbubble.com/shop/ap/12".to_string(),
        ],
        "listing",
        None,
    );
    pool.save(&config.storage.pool_path()).unwrap();

    let options = GenerateOptions {
        target: None,
        skip_discovery: true,
        date: NaiveDate::from_ymd_opt(2025, 5, 1),
    };

    // Fetcher is never used with skip_discovery
    let summary = generate::run_with_fetcher(&config, &options, fetcher_for("http://127.0.0.1:9"))
        .await
        .unwrap();

    assert_eq!(summary.selected, 2, "min(target, pool size) entries");
    assert!(summary.did_reset);
    assert_eq!(sitemap::entry_count(&config.storage.sitemap_path), 2);
}

#[tokio::test]
async fn test_retried_run_same_day_is_identical() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.selection.per_category_quotas = false;

    let mut pool = PoolStore::new();
    pool.merge(
        (0..20)
            .map(|i| format!("https://www.redbubble.com/shop/ap/{i}"))
            .collect::<Vec<_>>(),
        "listing",
        None,
    );
    pool.save(&config.storage.pool_path()).unwrap();

    let options = GenerateOptions {
        target: Some(5),
        skip_discovery: true,
        date: NaiveDate::from_ymd_opt(2025, 5, 3),
    };
    let fetcher = fetcher_for("http://127.0.0.1:9");

    generate::run_with_fetcher(&config, &options, Arc::clone(&fetcher))
        .await
        .unwrap();
    let first = feed_locs(&config.storage.sitemap_path);

    // A retry re-runs from the pre-run state (the crash happened before the
    // used-set was persisted)
    std::fs::remove_file(config.storage.used_path()).unwrap();

    generate::run_with_fetcher(&config, &options, fetcher).await.unwrap();
    let second = feed_locs(&config.storage.sitemap_path);

    assert_eq!(first, second, "same day and state must emit the same feed");
    assert_eq!(first.len(), 5);
}

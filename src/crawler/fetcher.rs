//! HTTP fetcher with rate limiting and block detection
//!
//! This module provides the page-fetch capability the discovery driver
//! consumes, with features including:
//! - User-Agent rotation
//! - Rate limiting with governor
//! - Automatic retry with exponential backoff for transient server errors
//! - Block and bot-challenge classification (the upstream site answers
//!   unwanted crawlers with 403/429 or a challenge page body)
//! - Optional capture of blocked bodies for offline diagnosis

use crate::utils::error::FetchError;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::seq::SliceRandom;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT},
    Client,
};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Markers that identify a bot-challenge page body
const CHALLENGE_NEEDLES: &[&str] = &[
    "attention required",
    "verify you are human",
    "captcha",
    "cloudflare",
    "/cdn-cgi/",
    "access denied",
    "request blocked",
];

/// Abstract page-fetch capability
///
/// The discovery driver only requires that failures (blocked, timed out,
/// challenge page) are distinguishable from successes; this trait is the
/// seam that keeps the engine testable without a network.
#[async_trait]
pub trait PageFetch: Send + Sync {
    /// Fetch a host-relative page path, returning the body on success
    async fn fetch_page(&self, path: &str) -> Result<String, FetchError>;
}

/// Check whether a response body is a bot-challenge page rather than
/// catalog content
#[must_use]
pub fn is_challenge_body(html: &str) -> bool {
    let low = html.to_lowercase();
    CHALLENGE_NEEDLES.iter().any(|n| low.contains(n))
}

/// Catalog site fetcher
///
/// Wraps a reqwest client with the rate limiting, retry and block
/// classification the upstream site demands.
pub struct CatalogFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Maximum number of retry attempts for transient failures
    max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    base_delay_ms: u64,

    /// Base URL prepended to page paths; points at a mock server in tests
    base_url: String,

    /// When set, blocked/challenge bodies are saved here for diagnosis
    debug_dir: Option<PathBuf>,
}

impl CatalogFetcher {
    /// Create a new fetcher with default retry settings
    ///
    /// # Arguments
    ///
    /// * `base_url` - Scheme and host, e.g. `https://www.redbubble.com`
    /// * `requests_per_second` - Maximum request rate
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(base_url: &str, requests_per_second: u32) -> Result<Self, FetchError> {
        Self::with_config(base_url, requests_per_second, 3, Duration::from_secs(20))
    }

    /// Create a new fetcher with custom retry configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_config(
        base_url: &str,
        requests_per_second: u32,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            max_retries,
            base_delay_ms: 1000,
            base_url: base_url.trim_end_matches('/').to_string(),
            debug_dir: None,
        })
    }

    /// Save blocked/challenge bodies under the given directory
    #[must_use]
    pub fn with_debug_dir(mut self, dir: &Path) -> Self {
        self.debug_dir = Some(dir.to_path_buf());
        self
    }

    /// Fetch with exponential backoff retry for transient failures
    async fn fetch_with_retry(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let headers = self.build_headers();

            match self.client.get(&url).headers(headers).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    // The site blocks with 403/429; retrying those only digs
                    // the hole deeper.
                    if status == 403 || status == 429 {
                        let body = response.text().await.unwrap_or_default();
                        self.debug_capture(path, &format!("status{status}"), &body).await;
                        return Err(FetchError::Blocked(status));
                    }

                    if !Self::should_retry(status) && status >= 400 {
                        return Err(FetchError::ServerError(status));
                    }

                    if status >= 400 {
                        last_error = Some(FetchError::ServerError(status));
                        continue;
                    }

                    let body = response.text().await.map_err(FetchError::Http)?;

                    if body.trim().is_empty() {
                        self.debug_capture(path, "empty", &body).await;
                        return Err(FetchError::EmptyBody);
                    }

                    if is_challenge_body(&body) {
                        self.debug_capture(path, "blocked", &body).await;
                        return Err(FetchError::Challenge);
                    }

                    return Ok(body);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(FetchError::Timeout);
                    } else {
                        last_error = Some(FetchError::Http(e));
                    }
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::MaxRetriesExceeded))
    }

    /// Transient statuses worth retrying; 403/429 are handled as blocks
    /// before this check
    fn should_retry(status: u16) -> bool {
        matches!(status, 500 | 502 | 503 | 504)
    }

    /// Build browser-like request headers with a rotated User-Agent
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(self.random_user_agent()));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        headers
    }

    /// Get a random user agent from the pool
    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
    }

    /// Write a failed body to the debug directory, best effort
    async fn debug_capture(&self, path: &str, tag: &str, body: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };

        let slug: String = path
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let file = dir.join(format!("{slug}_{tag}.html"));

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::debug!(error = %e, "Failed to create debug directory");
            return;
        }
        if let Err(e) = tokio::fs::write(&file, body).await {
            tracing::debug!(path = %file.display(), error = %e, "Failed to write debug capture");
        }
    }
}

#[async_trait]
impl PageFetch for CatalogFetcher {
    async fn fetch_page(&self, path: &str) -> Result<String, FetchError> {
        self.rate_limiter.until_ready().await;
        self.fetch_with_retry(path).await
    }
}

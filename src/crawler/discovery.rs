//! Discovery driver
//!
//! Grows the locator pool by scanning the shop's explore feed and one or
//! more listing pages per category. Fetches run as a small bounded worker
//! pool (the upstream site is rate sensitive); all pool writes happen
//! sequentially after the fan-in, so `merge` never sees concurrent
//! mutation.
//!
//! Failure containment is the driver's core contract: a blocked or failed
//! page is logged, counted and skipped, never fatal, and a pass that finds
//! nothing new leaves the existing pool untouched.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::extract::LinkExtractor;
use crate::crawler::fetcher::PageFetch;
use crate::crawler::list::ListingUrlBuilder;
use crate::crawler::url::LocatorNormalizer;
use crate::pool::PoolStore;
use crate::utils::error::FetchError;

/// One page the discovery pass will scan
#[derive(Debug, Clone)]
struct PageTask {
    /// Host-relative page path
    path: String,

    /// Provenance tag recorded on new pool entries
    source: &'static str,

    /// Category bucket for locators found on this page
    category: Option<String>,
}

/// Counters for one discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Pages fetched successfully
    pub pages_fetched: usize,

    /// Pages that failed or were blocked
    pub pages_failed: usize,

    /// Raw candidate hrefs seen before normalization
    pub raw_candidates: usize,

    /// Locators newly added to the pool
    pub new_locators: usize,

    /// At least one page answered with a block or challenge
    pub blocked: bool,
}

/// Orchestrates fetch → extract → normalize → merge for one pass
pub struct DiscoveryDriver {
    fetcher: Arc<dyn PageFetch>,
    extractor: LinkExtractor,
    normalizer: LocatorNormalizer,
    urls: ListingUrlBuilder,
    explore_pages: u32,
    listing_pages_per_category: u32,
    categories: Vec<String>,
    max_concurrent_fetches: usize,
}

impl DiscoveryDriver {
    /// Create a driver from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configured path shape fails to compile.
    pub fn new(fetcher: Arc<dyn PageFetch>, config: &Config) -> Result<Self> {
        let normalizer = LocatorNormalizer::new(
            &config.site.host,
            &config.site.path_shapes,
            config.site.strip_locale,
        )?;

        // Duplicate category codes would double-scan the same pages
        let mut categories = config.discovery.categories.clone();
        categories.sort();
        categories.dedup();

        Ok(Self {
            fetcher,
            extractor: LinkExtractor::new(),
            normalizer,
            urls: ListingUrlBuilder::new(&config.site.shop_user),
            explore_pages: config.discovery.explore_pages,
            listing_pages_per_category: config.discovery.listing_pages_per_category,
            categories,
            max_concurrent_fetches: config.discovery.max_concurrent_fetches.max(1),
        })
    }

    /// The pages one pass scans: explore first, then each category
    fn plan(&self) -> Vec<PageTask> {
        let mut tasks = Vec::new();

        for page in 1..=self.explore_pages {
            tasks.push(PageTask {
                path: self.urls.explore_page(page),
                source: "explore",
                category: None,
            });
        }

        for category in &self.categories {
            for page in 1..=self.listing_pages_per_category {
                tasks.push(PageTask {
                    path: self.urls.listing_page(category, page),
                    source: "listing",
                    category: Some(category.clone()),
                });
            }
        }

        tasks
    }

    /// Run one discovery pass, merging everything found into `pool`
    pub async fn run(&self, pool: &mut PoolStore) -> DiscoveryReport {
        let tasks = self.plan();
        let total_pages = tasks.len();

        tracing::info!(
            pages = total_pages,
            categories = self.categories.len(),
            concurrency = self.max_concurrent_fetches,
            "Starting discovery pass"
        );

        let mut results: Vec<(PageTask, Result<String, FetchError>)> = stream::iter(tasks)
            .map(|task| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let result = fetcher.fetch_page(&task.path).await;
                    (task, result)
                }
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        // Fan-in order is nondeterministic; merge in plan order so category
        // assignment (first wins) is stable across runs.
        results.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

        let mut report = DiscoveryReport::default();

        for (task, result) in results {
            match result {
                Ok(body) => {
                    report.pages_fetched += 1;

                    let raw = self.extractor.extract(&body);
                    let locators: Vec<String> = raw
                        .iter()
                        .filter_map(|candidate| self.normalizer.normalize(candidate))
                        .collect();

                    report.raw_candidates += raw.len();
                    let added = pool.merge(locators, task.source, task.category.as_deref());
                    report.new_locators += added;

                    tracing::debug!(
                        path = %task.path,
                        candidates = raw.len(),
                        added,
                        "Processed discovery page"
                    );
                }
                Err(e) => {
                    report.pages_failed += 1;
                    if e.is_block() {
                        report.blocked = true;
                    }

                    tracing::warn!(
                        path = %task.path,
                        source = task.source,
                        category = ?task.category,
                        error = %e,
                        "Discovery page failed, skipping"
                    );
                }
            }
        }

        tracing::info!(
            fetched = report.pages_fetched,
            failed = report.pages_failed,
            candidates = report.raw_candidates,
            new = report.new_locators,
            pool = pool.size(),
            blocked = report.blocked,
            "Discovery pass complete"
        );

        report
    }
}

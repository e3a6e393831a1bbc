//! The full run: discover, select, emit
//!
//! Orchestrates one complete pass and enforces the run contract: the exit
//! status reflects whether a usable feed exists afterwards, and a blocked
//! run never regresses a non-empty published feed to empty. The feed
//! emitter is skipped, not fed an empty selection, whenever nothing could
//! be chosen and a prior feed exists.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::discovery::DiscoveryDriver;
use crate::crawler::fetcher::PageFetch;
use crate::models::RunSummary;
use crate::pool::used::UsedSet;
use crate::pool::PoolStore;
use crate::rotation::{self, day_seed};
use crate::sitemap;

/// Options for one generate run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Override the configured feed target
    pub target: Option<usize>,

    /// Skip the discovery pass and select from the existing pool only
    pub skip_discovery: bool,

    /// Selection date; defaults to today (UTC). Selections are
    /// deterministic per date, so a retried run emits the same feed.
    pub date: Option<NaiveDate>,
}

/// Run the full pipeline with the configured HTTP fetcher
pub async fn run(config: &Config, options: &GenerateOptions) -> Result<RunSummary> {
    config.validate().context("Invalid configuration")?;
    let fetcher = super::build_fetcher(config).context("Failed to build fetcher")?;
    run_with_fetcher(config, options, fetcher).await
}

/// Run the full pipeline against an injected fetch capability
pub async fn run_with_fetcher(
    config: &Config,
    options: &GenerateOptions,
    fetcher: Arc<dyn PageFetch>,
) -> Result<RunSummary> {
    let pool_path = config.storage.pool_path();
    let used_path = config.storage.used_path();

    let mut pool = PoolStore::load(&pool_path).with_capacity(config.selection.pool_capacity);
    let mut used = UsedSet::load(&used_path);
    let mut summary = RunSummary::default();

    if !options.skip_discovery {
        let driver = DiscoveryDriver::new(fetcher, config)?;
        let report = driver.run(&mut pool).await;

        summary.pages_fetched = report.pages_fetched;
        summary.pages_failed = report.pages_failed;
        summary.raw_candidates = report.raw_candidates;
        summary.new_locators = report.new_locators;
        summary.blocked = report.blocked;

        pool.save(&pool_path).context("Failed to persist pool")?;

        if report.new_locators == 0 {
            tracing::warn!("Discovery found no new locators this run");
            if report.blocked {
                tracing::warn!(
                    "Discovery looks blocked; inspect debug captures if enabled"
                );
            }
        }
    }

    summary.pool_size = pool.size();

    let target = options.target.unwrap_or(config.selection.target_urls);
    let date = options.date.unwrap_or_else(|| Utc::now().date_naive());
    let seed = day_seed(date);

    used.prune(&pool);

    let outcome = if config.selection.per_category_quotas {
        rotation::select_partitioned(&pool, used.as_set(), target, seed)
    } else {
        rotation::select(&pool.all(), used.as_set(), target, seed)
    };

    if outcome.chosen.is_empty() {
        let prior = sitemap::entry_count(&config.storage.sitemap_path);
        if prior > 0 {
            tracing::warn!(
                entries = prior,
                "Nothing to select this run; keeping the existing feed"
            );
            summary.feed_entries = prior;
            return Ok(summary);
        }

        anyhow::bail!(
            "no locators available (pool size {}) and no existing feed to keep",
            pool.size()
        );
    }

    let now = Utc::now();
    sitemap::write(&config.storage.sitemap_path, &outcome.chosen, now)
        .context("Failed to write sitemap")?;

    used.apply(&outcome, now);
    used.save(&used_path).context("Failed to persist used-set")?;

    summary.selected = outcome.chosen.len();
    summary.did_reset = outcome.did_reset;
    summary.feed_written = true;
    summary.feed_entries = outcome.chosen.len();

    tracing::info!(
        discovered = summary.raw_candidates,
        new = summary.new_locators,
        pool = summary.pool_size,
        selected = summary.selected,
        reset = summary.did_reset,
        sitemap = %config.storage.sitemap_path.display(),
        "Run complete"
    );

    Ok(summary)
}

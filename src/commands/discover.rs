//! Discovery-only command: grow the pool without emitting a feed

use anyhow::{Context, Result};

use crate::config::Config;
use crate::crawler::discovery::{DiscoveryDriver, DiscoveryReport};
use crate::pool::PoolStore;

/// Run one discovery pass and persist the grown pool
pub async fn run(config: &Config) -> Result<DiscoveryReport> {
    config.validate().context("Invalid configuration")?;

    let fetcher = super::build_fetcher(config).context("Failed to build fetcher")?;
    let driver = DiscoveryDriver::new(fetcher, config)?;

    let pool_path = config.storage.pool_path();
    let mut pool = PoolStore::load(&pool_path).with_capacity(config.selection.pool_capacity);

    let report = driver.run(&mut pool).await;
    pool.save(&pool_path).context("Failed to persist pool")?;

    println!(
        "Discovery: {} pages fetched, {} failed, {} new locators (pool total: {})",
        report.pages_fetched,
        report.pages_failed,
        report.new_locators,
        pool.size()
    );
    if report.blocked {
        println!("Warning: at least one page was blocked or served a challenge");
    }

    Ok(report)
}

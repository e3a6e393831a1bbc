//! State report: pool, rotation cycle and feed at a glance

use anyhow::Result;

use crate::config::Config;
use crate::pool::used::UsedSet;
use crate::pool::PoolStore;
use crate::sitemap;

/// Print pool, used-set and feed state
pub fn run(config: &Config) -> Result<()> {
    let pool = PoolStore::load(&config.storage.pool_path());
    let mut used = UsedSet::load(&config.storage.used_path());
    let stale = used.prune(&pool);

    let available = pool.size().saturating_sub(used.len());
    let feed_entries = sitemap::entry_count(&config.storage.sitemap_path);
    let target = config.selection.target_urls;

    println!("Pool: {} locators", pool.size());
    for key in pool.bucket_keys() {
        let count = pool.bucket(key.as_deref()).len();
        match key {
            Some(category) => println!("  {category}: {count}"),
            None => println!("  (uncategorized): {count}"),
        }
    }

    println!("Used this cycle: {} ({} stale entries ignored)", used.len(), stale);
    match used.last_reset() {
        Some(ts) => println!("Last cycle reset: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Last cycle reset: never"),
    }

    println!("Available before next reset: {available}");
    if target > 0 && pool.size() > 0 {
        let runs_left = available / target;
        println!("Full selections left in this cycle: {runs_left}");
    }

    println!(
        "Feed: {} entries at {}",
        feed_entries,
        config.storage.sitemap_path.display()
    );

    Ok(())
}

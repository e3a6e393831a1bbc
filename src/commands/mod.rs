//! CLI command implementations

pub mod discover;
pub mod generate;
pub mod status;

use crate::config::Config;
use crate::crawler::fetcher::{CatalogFetcher, PageFetch};
use crate::utils::error::FetchError;
use std::sync::Arc;

/// Build the real catalog fetcher from configuration
pub(crate) fn build_fetcher(config: &Config) -> Result<Arc<dyn PageFetch>, FetchError> {
    let mut fetcher = CatalogFetcher::with_config(
        &config.base_url(),
        config.discovery.rate_limit,
        config.discovery.max_retries,
        config.request_timeout(),
    )?;

    if let Some(dir) = &config.discovery.debug_dir {
        fetcher = fetcher.with_debug_dir(dir);
    }

    Ok(Arc::new(fetcher))
}

//! rotamap - Rotating sitemap generator for catalog shops
//!
//! Discovers product page locators in a shop, accumulates them in a durable
//! pool, and emits a bounded, non-repeating daily selection as an XML
//! sitemap.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Page fetching, link extraction and locator normalization
//! - [`pool`] - Durable locator pool and used-set tracking
//! - [`rotation`] - Day-deterministic selection with per-category quotas
//! - [`sitemap`] - Feed emission
//! - [`models`] - Shared run-level types
//! - [`commands`] - CLI command orchestration
//! - [`utils`] - Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use rotamap::commands::generate::{self, GenerateOptions};
//! use rotamap::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let summary = generate::run(&config, &GenerateOptions::default()).await?;
//!     println!("Emitted {} locators", summary.selected);
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod crawler;
pub mod models;
pub mod pool;
pub mod rotation;
pub mod sitemap;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::discovery::{DiscoveryDriver, DiscoveryReport};
    pub use crate::crawler::fetcher::{CatalogFetcher, PageFetch};
    pub use crate::crawler::url::LocatorNormalizer;
    pub use crate::models::RunSummary;
    pub use crate::pool::used::UsedSet;
    pub use crate::pool::{PoolEntry, PoolStore};
    pub use crate::rotation::{day_seed, select, select_partitioned, SelectionOutcome};
    pub use crate::utils::error::FetchError;
}

// Direct re-exports for convenience
pub use models::RunSummary;
pub use pool::{PoolEntry, PoolStore};

//! Configuration management for the rotamap crawler
//!
//! All site identity, scan widths, category codes and state paths live here
//! as one immutable value handed to the discovery driver and commands at
//! construction. Configuration loads from a TOML file or from `ROTAMAP_*`
//! environment variables, with built-in defaults for everything.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crawler::url::DEFAULT_PATH_SHAPES;

/// Category codes the default shop exposes (`iaCode` query values)
const DEFAULT_CATEGORIES: &[&str] = &[
    "w-dresses",
    "u-sweatshirts",
    "u-tees",
    "u-tanks",
    "u-case-iphone",
    "u-case-samsung",
    "all-stickers",
    "u-print-board-gallery",
    "u-print-art",
    "u-print-canvas",
    "u-print-frame",
    "u-print-photo",
    "u-print-poster",
    "u-block-acrylic",
    "u-apron",
    "u-bath-mat",
    "u-bedding",
    "u-clock",
    "u-coasters",
    "u-die-cut-magnet",
    "u-mugs",
    "u-pillows",
    "u-shower-curtain",
    "u-print-tapestry",
    "u-card-greeting",
    "u-notebook-hardcover",
    "all-mouse-pads",
    "u-card-post",
    "u-notebook-spiral",
    "u-backpack",
    "u-bag-drawstring",
    "u-duffle-bag",
    "all-hats",
    "u-pin-button",
    "w-scarf",
    "u-tech-accessories",
    "all-totes",
    "u-bag-studiopouch",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog site identity
    pub site: SiteConfig,

    /// Discovery scan configuration
    pub discovery: DiscoveryConfig,

    /// Selection and rotation configuration
    pub selection: SelectionConfig,

    /// State and output paths
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Catalog site identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Canonical host of the catalog site
    pub host: String,

    /// Shop user whose pages are scanned
    pub shop_user: String,

    /// Accepted product path shapes; group 1 captures the numeric id
    pub path_shapes: Vec<String>,

    /// Collapse a leading two-letter locale path segment
    pub strip_locale: bool,
}

/// Discovery scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Explore (newest designs) pages to scan per run
    pub explore_pages: u32,

    /// Listing pages to scan per category per run
    pub listing_pages_per_category: u32,

    /// Category codes to scan
    pub categories: Vec<String>,

    /// Concurrent page fetches (the upstream site is rate sensitive)
    pub max_concurrent_fetches: usize,

    /// Rate limit (requests per second)
    pub rate_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum retry attempts per page
    pub max_retries: u32,

    /// Save blocked/challenge page bodies here for diagnosis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<PathBuf>,
}

/// Selection and rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Product URLs per emitted feed
    pub target_urls: usize,

    /// Split the target into fair per-category quotas
    pub per_category_quotas: bool,

    /// Hard ceiling on pool size; oldest entries are evicted beyond it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_capacity: Option<usize>,
}

/// State and output paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for pool and used-set state files
    pub data_dir: PathBuf,

    /// Output path of the emitted feed
    pub sitemap_path: PathBuf,
}

impl StorageConfig {
    /// Path of the pool state file
    #[must_use]
    pub fn pool_path(&self) -> PathBuf {
        self.data_dir.join("pool.json")
    }

    /// Path of the used-set state file
    #[must_use]
    pub fn used_path(&self) -> PathBuf {
        self.data_dir.join("used.json")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("ROTAMAP_HOST") {
            config.site.host = host;
        }
        if let Ok(user) = std::env::var("ROTAMAP_SHOP_USER") {
            config.site.shop_user = user;
        }
        if let Some(target) = env_parse::<usize>("ROTAMAP_TARGET_URLS") {
            config.selection.target_urls = target;
        }
        if let Some(pages) = env_parse::<u32>("ROTAMAP_EXPLORE_PAGES") {
            config.discovery.explore_pages = pages;
        }
        if let Some(pages) = env_parse::<u32>("ROTAMAP_LISTING_PAGES") {
            config.discovery.listing_pages_per_category = pages;
        }
        if let Some(rate) = env_parse::<u32>("ROTAMAP_RATE_LIMIT") {
            config.discovery.rate_limit = rate;
        }
        if let Some(concurrency) = env_parse::<usize>("ROTAMAP_MAX_CONCURRENT_FETCHES") {
            config.discovery.max_concurrent_fetches = concurrency;
        }
        if let Ok(dir) = std::env::var("ROTAMAP_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("ROTAMAP_SITEMAP_PATH") {
            config.storage.sitemap_path = PathBuf::from(path);
        }
        if let Ok(level) = std::env::var("ROTAMAP_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.site.host.trim().is_empty() {
            anyhow::bail!("site host must not be empty");
        }

        if self.site.shop_user.trim().is_empty() {
            anyhow::bail!("shop_user must not be empty");
        }

        if self.site.path_shapes.is_empty() {
            anyhow::bail!("at least one path shape is required");
        }

        if self.discovery.max_concurrent_fetches == 0 {
            anyhow::bail!("max_concurrent_fetches must be greater than 0");
        }

        if self.discovery.rate_limit == 0 {
            anyhow::bail!("rate_limit must be positive");
        }

        if let Some(capacity) = self.selection.pool_capacity {
            if capacity == 0 {
                anyhow::bail!("pool_capacity must be greater than 0 when set");
            }
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery.request_timeout_secs)
    }

    /// Scheme-and-host base URL of the catalog site
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.site.host)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig {
                host: String::from("www.redbubble.com"),
                shop_user: String::from("WearWink"),
                path_shapes: DEFAULT_PATH_SHAPES.iter().map(|s| s.to_string()).collect(),
                strip_locale: true,
            },
            discovery: DiscoveryConfig {
                explore_pages: 3,
                listing_pages_per_category: 1,
                categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
                max_concurrent_fetches: 4,
                rate_limit: 1,
                request_timeout_secs: 20,
                max_retries: 3,
                debug_dir: None,
            },
            selection: SelectionConfig {
                target_urls: 1100,
                per_category_quotas: true,
                pool_capacity: None,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                sitemap_path: PathBuf::from("sitemap.xml"),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

//! Discovery crawling: fetch, extract, normalize
//!
//! This module implements the discovery side of the engine: rate-limited
//! page fetching with block classification, raw link extraction, locator
//! normalization, and the driver that orchestrates one bounded discovery
//! pass over explore and category listing pages.

pub mod discovery;
pub mod extract;
pub mod fetcher;
pub mod list;
pub mod url;

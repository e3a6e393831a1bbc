//! Raw link extraction from catalog list pages
//!
//! Extraction is deliberately permissive: it returns every candidate href
//! found in the document, and the normalizer decides which of them denote
//! products. Links are collected two ways, since listing pages embed product
//! links both in anchor tags and in inline JSON blobs:
//! - DOM anchors via `scraper`
//! - a regex sweep over the raw HTML for id-bearing paths

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracts raw candidate hrefs from a fetched page body
pub struct LinkExtractor {
    /// Direct product paths embedded anywhere in the document
    ap_path: Regex,
    /// Item paths (`/i/{kind}/{title}/{id}`) embedded anywhere
    item_path: Regex,
    /// Anchor selector, compiled once
    anchors: Selector,
}

impl LinkExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ap_path: Regex::new(r#"/shop/ap/\d+"#).unwrap(),
            item_path: Regex::new(r#"/i/[^"'\s<>]+/\d+[^"'\s<>]*"#).unwrap(),
            anchors: Selector::parse("a[href]").unwrap(),
        }
    }

    /// Extract candidate hrefs from list page HTML
    ///
    /// # Arguments
    ///
    /// * `html` - HTML content of a listing or explore page
    ///
    /// # Returns
    ///
    /// Deduplicated, sorted vector of raw candidate strings. Candidates are
    /// not validated; feed them through the normalizer.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let mut candidates = HashSet::new();

        let document = Html::parse_document(html);
        for element in document.select(&self.anchors) {
            if let Some(href) = element.value().attr("href") {
                candidates.insert(href.to_string());
            }
        }

        for m in self.ap_path.find_iter(html) {
            candidates.insert(m.as_str().to_string());
        }
        for m in self.item_path.find_iter(html) {
            candidates.insert(m.as_str().to_string());
        }

        // Sorted for deterministic output
        let mut result: Vec<String> = candidates.into_iter().collect();
        result.sort();
        result
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

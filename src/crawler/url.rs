//! Locator extraction and normalization for catalog product pages
//!
//! This module canonicalizes the many href shapes a shop page uses for one
//! product into a single comparable locator string. Handles:
//! - Direct product links: `/shop/ap/{id}`
//! - Item links: `/i/{kind}/{title}/{id}` (optionally with a SKU suffix)
//! - Locale-prefixed variants: `/de/shop/ap/{id}`, `/fr/i/...`
//! - Absolute, scheme-relative and host-relative hrefs

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

/// Default accepted path shapes. Each pattern must capture the numeric
/// product id in group 1.
pub const DEFAULT_PATH_SHAPES: &[&str] = &[
    r"^/shop/ap/(\d+)(?:/.*)?$",
    r"^/i/.+/(\d+)(?:\.[^/]*)?$",
];

/// Canonicalizes raw href strings into comparable product locators
///
/// Two raw strings that denote the same product normalize to byte-identical
/// output; normalization is idempotent. The function is total: any input
/// that is empty, malformed, on a foreign host, or outside the accepted
/// path shapes yields `None`.
///
/// # Examples
///
/// ```
/// use rotamap::crawler::url::LocatorNormalizer;
///
/// let norm = LocatorNormalizer::with_defaults("www.redbubble.com").unwrap();
/// let canonical = norm.normalize("/de/i/t-shirt/Cool-Cat/151781294.FB110?ref=feed").unwrap();
/// assert_eq!(canonical, "https://www.redbubble.com/shop/ap/151781294");
/// assert_eq!(norm.normalize(&canonical).unwrap(), canonical);
/// ```
pub struct LocatorNormalizer {
    /// Canonical host, lowercase
    host: String,
    /// Accepted path shapes, each capturing the product id
    shapes: Vec<Regex>,
    /// Drop a leading two-letter locale segment before matching
    strip_locale: bool,
    /// Pattern for the locale segment itself
    locale_pattern: Regex,
}

impl LocatorNormalizer {
    /// Create a normalizer with explicit accepted shapes
    ///
    /// # Arguments
    ///
    /// * `host` - Canonical host name (e.g. `www.redbubble.com`)
    /// * `shapes` - Path regexes; group 1 of each must capture the numeric id
    /// * `strip_locale` - Collapse a leading `/xx/` locale segment
    ///
    /// # Errors
    ///
    /// Returns an error if any shape pattern fails to compile.
    pub fn new(host: &str, shapes: &[String], strip_locale: bool) -> Result<Self> {
        let shapes = shapes
            .iter()
            .map(|s| Regex::new(s).with_context(|| format!("Invalid path shape pattern: {s}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            host: host.to_ascii_lowercase(),
            shapes,
            strip_locale,
            locale_pattern: Regex::new(r"^/[a-z]{2}(/.*)$").unwrap(),
        })
    }

    /// Create a normalizer with the default product path shapes
    pub fn with_defaults(host: &str) -> Result<Self> {
        let shapes: Vec<String> = DEFAULT_PATH_SHAPES.iter().map(|s| s.to_string()).collect();
        Self::new(host, &shapes, true)
    }

    /// Normalize a raw href into the canonical product locator
    ///
    /// Forces `https` and the configured host, strips query string and
    /// fragment, collapses the locale segment, and rebuilds the locator in
    /// the canonical `/shop/ap/{id}` form.
    ///
    /// # Arguments
    ///
    /// * `raw` - Raw href (absolute, scheme-relative, or host-relative)
    ///
    /// # Returns
    ///
    /// Canonical locator, or `None` if the input is not a product link on
    /// the configured host.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let id = self.product_id(raw)?;
        Some(format!("https://{}/shop/ap/{id}", self.host))
    }

    /// Extract the numeric product id from a raw href
    ///
    /// Applies the same host and shape rules as [`normalize`](Self::normalize).
    pub fn product_id(&self, raw: &str) -> Option<u64> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let absolute = if let Some(rest) = raw.strip_prefix("//") {
            format!("https://{rest}")
        } else if raw.starts_with('/') {
            format!("https://{}{raw}", self.host)
        } else {
            raw.to_string()
        };

        let parsed = Url::parse(&absolute).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }

        let host = parsed.host_str()?;
        if !host.eq_ignore_ascii_case(&self.host) {
            return None;
        }

        // Query and fragment are discarded here: only the path is matched.
        self.match_path(parsed.path())
    }

    /// Match a URL path against the accepted shapes, retrying once with the
    /// locale segment collapsed
    fn match_path(&self, path: &str) -> Option<u64> {
        if let Some(id) = self.match_shapes(path) {
            return Some(id);
        }

        if self.strip_locale {
            if let Some(caps) = self.locale_pattern.captures(path) {
                return self.match_shapes(&caps[1]);
            }
        }

        None
    }

    fn match_shapes(&self, path: &str) -> Option<u64> {
        for shape in &self.shapes {
            if let Some(caps) = shape.captures(path) {
                if let Ok(id) = caps[1].parse::<u64>() {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Canonical host this normalizer accepts
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn normalizer() -> LocatorNormalizer {
        LocatorNormalizer::with_defaults("www.redbubble.com").unwrap()
    }

    #[test]
    fn test_normalize_shop_ap_link() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("https://www.redbubble.com/shop/ap/151781294"),
            Some("https://www.redbubble.com/shop/ap/151781294".to_string())
        );
    }

    #[test]
    fn test_normalize_item_link() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("https://www.redbubble.com/i/sticker/Mountain-Sunset/98765432.EJUG5"),
            Some("https://www.redbubble.com/shop/ap/98765432".to_string())
        );
    }

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("https://www.redbubble.com/shop/ap/123456?asc=u&ref=explore#top"),
            Some("https://www.redbubble.com/shop/ap/123456".to_string())
        );
    }

    #[test]
    fn test_normalize_collapses_locale_segment() {
        let norm = normalizer();
        let expected = Some("https://www.redbubble.com/shop/ap/123456".to_string());
        assert_eq!(norm.normalize("https://www.redbubble.com/de/shop/ap/123456"), expected);
        assert_eq!(norm.normalize("/fr/i/t-shirt/Chat-Noir/123456.ABC"), expected);
    }

    #[test]
    fn test_normalize_host_relative_href() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("/shop/ap/42"),
            Some("https://www.redbubble.com/shop/ap/42".to_string())
        );
    }

    #[test]
    fn test_normalize_scheme_relative_href() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("//www.redbubble.com/shop/ap/42"),
            Some("https://www.redbubble.com/shop/ap/42".to_string())
        );
    }

    #[test]
    fn test_normalize_forces_https() {
        let norm = normalizer();
        assert_eq!(
            norm.normalize("http://www.redbubble.com/shop/ap/42"),
            Some("https://www.redbubble.com/shop/ap/42".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_foreign_host() {
        let norm = normalizer();
        assert_eq!(norm.normalize("https://evil.example.com/shop/ap/42"), None);
        assert_eq!(norm.normalize("https://redbubble.com/shop/ap/42"), None);
    }

    #[test]
    fn test_normalize_rejects_unrecognized_paths() {
        let norm = normalizer();
        assert_eq!(norm.normalize("https://www.redbubble.com/people/SomeArtist/shop"), None);
        assert_eq!(norm.normalize("https://www.redbubble.com/explore"), None);
        assert_eq!(norm.normalize("https://www.redbubble.com/shop/ap/not-a-number"), None);
    }

    #[test]
    fn test_normalize_rejects_malformed_input() {
        let norm = normalizer();
        assert_eq!(norm.normalize(""), None);
        assert_eq!(norm.normalize("   "), None);
        assert_eq!(norm.normalize("not a url"), None);
        assert_eq!(norm.normalize("javascript:void(0)"), None);
        assert_eq!(norm.normalize("mailto:shop@example.com"), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let norm = normalizer();
        let canonical = norm.normalize("/de/i/poster/Wave/555.XYZ").unwrap();
        assert_eq!(norm.normalize(&canonical), Some(canonical.clone()));
    }

    #[test]
    fn test_product_id() {
        let norm = normalizer();
        assert_eq!(norm.product_id("/shop/ap/151781294"), Some(151781294));
        assert_eq!(norm.product_id("/i/mug/Morning/998.ABC"), Some(998));
        assert_eq!(norm.product_id("/people/SomeArtist/shop"), None);
    }

    #[test]
    fn test_custom_shapes() {
        let shapes = vec![r"^/listing/(\d+)$".to_string()];
        let norm = LocatorNormalizer::new("shop.example.com", &shapes, false).unwrap();
        assert_eq!(
            norm.normalize("https://shop.example.com/listing/77"),
            Some("https://shop.example.com/shop/ap/77".to_string())
        );
        assert_eq!(norm.normalize("https://shop.example.com/shop/ap/77"), None);
    }

    #[test]
    fn test_invalid_shape_pattern_rejected() {
        let shapes = vec![r"([unclosed".to_string()];
        assert!(LocatorNormalizer::new("shop.example.com", &shapes, false).is_err());
    }

    proptest! {
        // normalize(normalize(x)) == normalize(x) for any input
        #[test]
        fn prop_normalize_idempotent_on_arbitrary_input(raw in ".*") {
            let norm = normalizer();
            if let Some(canonical) = norm.normalize(&raw) {
                prop_assert_eq!(norm.normalize(&canonical), Some(canonical.clone()));
            }
        }

        #[test]
        fn prop_all_link_shapes_agree_on_id(
            id in 1u64..1_000_000_000,
            kind in "[a-z]{3,10}",
            slug in "[A-Za-z0-9-]{1,24}",
            locale in proptest::option::of("[a-z]{2}"),
        ) {
            let norm = normalizer();
            let prefix = locale.map(|l| format!("/{l}")).unwrap_or_default();
            let direct = format!("{prefix}/shop/ap/{id}");
            let item = format!("{prefix}/i/{kind}/{slug}/{id}");

            let expected = format!("https://www.redbubble.com/shop/ap/{id}");
            prop_assert_eq!(norm.normalize(&direct), Some(expected.clone()));
            prop_assert_eq!(norm.normalize(&item), Some(expected));
        }
    }
}

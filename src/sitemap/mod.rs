//! Sitemap feed emission
//!
//! Serializes a selection into the standard XML sitemap schema and answers
//! whether a usable prior feed exists. The write is atomic
//! (temp-then-rename) so a crash cannot leave a truncated feed behind, and
//! the non-regression rule in the run orchestration relies on
//! [`entry_count`] reading the published artifact itself rather than a
//! sidecar counter.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// XML namespace of the sitemap schema
pub const SITEMAP_XMLNS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Write a sitemap with one `<url>` entry per locator
///
/// All entries share the given `lastmod` timestamp, formatted as
/// `%Y-%m-%dT%H:%M:%SZ`. `&`, `<`, `>`, `"` are escaped inside `<loc>`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or renamed.
pub fn write(path: &Path, locators: &[String], lastmod: DateTime<Utc>) -> Result<()> {
    let lastmod = lastmod.format("%Y-%m-%dT%H:%M:%SZ");

    let mut xml = String::with_capacity(locators.len() * 120 + 128);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_XMLNS}\">\n"));

    for locator in locators {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}</loc>\n",
            html_escape::encode_quoted_attribute(locator)
        ));
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create sitemap directory: {}", parent.display())
            })?;
        }
    }

    let temp_path = path.with_extension("xml.tmp");
    fs::write(&temp_path, &xml)
        .with_context(|| format!("Failed to write sitemap: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename sitemap: {}", path.display()))?;

    tracing::debug!(path = %path.display(), entries = locators.len(), "Sitemap written");
    Ok(())
}

/// Count the `<loc>` entries of an existing feed
///
/// Returns 0 for a missing or unreadable file; a nonzero count means a
/// usable prior feed exists.
#[must_use]
pub fn entry_count(path: &Path) -> usize {
    match fs::read_to_string(path) {
        Ok(content) => content.matches("<loc>").count(),
        Err(_) => 0,
    }
}

//! Durable locator pool
//!
//! The pool is the system's memory: every product locator ever discovered,
//! keyed by canonical locator with provenance metadata. It only grows across
//! runs (merge is append-only), except for an optional hard capacity cap:
//! when a merge pushes past the cap, oldest-by-first-seen entries are
//! evicted FIFO until the pool fits again.
//!
//! Persistence is a JSON object keyed by locator, written atomically
//! (temp-then-rename) so a crash mid-write cannot corrupt state. A missing
//! or unreadable file loads as an empty pool: state is additive and cheap to
//! rebuild, so availability wins over strict durability.

pub mod used;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Provenance metadata for one pooled locator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    /// When the locator was first observed
    pub first_seen: DateTime<Utc>,

    /// When the locator was most recently observed
    pub last_seen: DateTime<Utc>,

    /// Discovery source tag (`explore`, `listing`)
    pub source: String,

    /// Category bucket; first assignment wins, later observations under a
    /// different category do not move the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Numeric product id derived from the canonical locator tail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Durable mapping from canonical locator to provenance metadata
#[derive(Debug, Default)]
pub struct PoolStore {
    entries: BTreeMap<String, PoolEntry>,
    capacity: Option<usize>,
}

impl PoolStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a hard capacity ceiling; `None` means unbounded
    #[must_use]
    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Merge newly observed locators into the pool
    ///
    /// Locators not yet present are inserted with `first_seen = now`;
    /// already-present locators get `last_seen = now`. Safe to call with an
    /// empty sequence.
    ///
    /// # Arguments
    ///
    /// * `locators` - Canonical locators (normalizer output)
    /// * `source` - Discovery source tag for new entries
    /// * `category` - Category bucket for new entries, if known
    ///
    /// # Returns
    ///
    /// Count of genuinely new entries.
    pub fn merge<I>(&mut self, locators: I, source: &str, category: Option<&str>) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let now = Utc::now();
        let mut incoming = Vec::new();

        for locator in locators {
            if let Some(entry) = self.entries.get_mut(&locator) {
                entry.last_seen = now;
            } else if !incoming.contains(&locator) {
                incoming.push(locator);
            }
        }

        if incoming.is_empty() {
            return 0;
        }

        let added = incoming.len();
        for locator in incoming {
            let id = derive_numeric_id(&locator);
            self.entries.insert(
                locator,
                PoolEntry {
                    first_seen: now,
                    last_seen: now,
                    source: source.to_string(),
                    category: category.map(String::from),
                    id,
                },
            );
        }

        self.trim_to_capacity();
        added
    }

    /// Evict oldest entries (by `first_seen`, then locator order) until the
    /// pool fits under the capacity cap. Pre-existing entries are always
    /// older than the batch being inserted, so this is FIFO on `first_seen`.
    fn trim_to_capacity(&mut self) {
        let Some(cap) = self.capacity else {
            return;
        };

        while self.entries.len() > cap {
            let oldest = self
                .entries
                .iter()
                .min_by(|(ka, a), (kb, b)| a.first_seen.cmp(&b.first_seen).then(ka.cmp(kb)))
                .map(|(k, _)| k.clone());

            if let Some(key) = oldest {
                tracing::debug!(locator = %key, "Evicting oldest pool entry at capacity");
                self.entries.remove(&key);
            } else {
                break;
            }
        }
    }

    /// All locators currently held, in sorted order
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Locators in one category bucket (`None` = uncategorized), sorted
    #[must_use]
    pub fn bucket(&self, category: Option<&str>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.category.as_deref() == category)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Bucket keys present in the pool: named categories in sorted order,
    /// then `None` if any entry is uncategorized
    #[must_use]
    pub fn bucket_keys(&self) -> Vec<Option<String>> {
        let mut named: Vec<String> = Vec::new();
        let mut has_uncategorized = false;

        for entry in self.entries.values() {
            match &entry.category {
                Some(c) => {
                    if !named.contains(c) {
                        named.push(c.clone());
                    }
                }
                None => has_uncategorized = true,
            }
        }

        named.sort();
        let mut keys: Vec<Option<String>> = named.into_iter().map(Some).collect();
        if has_uncategorized {
            keys.push(None);
        }
        keys
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, locator: &str) -> bool {
        self.entries.contains_key(locator)
    }

    #[must_use]
    pub fn get(&self, locator: &str) -> Option<&PoolEntry> {
        self.entries.get(locator)
    }

    /// Load a pool from disk
    ///
    /// A missing file yields an empty pool; a corrupt file is logged and
    /// also yields an empty pool rather than aborting the run.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let entries = File::open(path)
            .ok()
            .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok());

        match entries {
            Some(entries) => Self {
                entries,
                capacity: None,
            },
            None => {
                tracing::warn!(
                    path = %path.display(),
                    "Pool file unreadable or corrupt, starting from empty pool"
                );
                Self::new()
            }
        }
    }

    /// Save the pool atomically (write-temp-then-rename)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, serialized or renamed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }

        let temp_path = path.with_extension("json.tmp");
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create pool file: {}", temp_path.display()))?;

        serde_json::to_writer_pretty(BufWriter::new(file), &self.entries)
            .context("Failed to serialize pool")?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename pool file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), entries = self.entries.len(), "Pool saved");
        Ok(())
    }
}

/// Derive the numeric product id from a canonical locator tail, if numeric
fn derive_numeric_id(locator: &str) -> Option<u64> {
    locator.rsplit('/').next().and_then(|tail| tail.parse().ok())
}

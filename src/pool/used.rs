//! Used-set tracker for rotation cycles
//!
//! Records which pool locators have already been emitted in some prior
//! selection, plus the timestamp of the last rotation reset. The invariant
//! `used ⊆ pool` is restored by [`UsedSet::prune`] before every selection,
//! which defends against pool shrinkage or hand-edited state files.

use crate::pool::PoolStore;
use crate::rotation::SelectionOutcome;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Locators already selected in a prior run, with the last reset time
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UsedSet {
    /// Locators emitted since the last reset (sorted on disk)
    used: BTreeSet<String>,

    /// When the rotation cycle last wrapped, if ever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_reset: Option<DateTime<Utc>>,
}

impl UsedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    #[must_use]
    pub fn contains(&self, locator: &str) -> bool {
        self.used.contains(locator)
    }

    #[must_use]
    pub fn last_reset(&self) -> Option<DateTime<Utc>> {
        self.last_reset
    }

    /// Borrow the underlying set for selection
    #[must_use]
    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Drop used entries that are no longer in the pool
    ///
    /// # Returns
    ///
    /// The number of stale entries removed.
    pub fn prune(&mut self, pool: &PoolStore) -> usize {
        let before = self.used.len();
        self.used.retain(|locator| pool.contains(locator));
        let removed = before - self.used.len();

        if removed > 0 {
            tracing::debug!(removed, "Pruned stale used-set entries");
        }
        removed
    }

    /// Apply a selection outcome: replace the set and record a reset time
    /// if the cycle wrapped
    pub fn apply(&mut self, outcome: &SelectionOutcome, now: DateTime<Utc>) {
        if outcome.did_reset {
            self.last_reset = Some(now);
        }
        self.used = outcome.used.clone();
    }

    /// Load a used-set from disk
    ///
    /// Missing or corrupt files yield an empty set, mirroring the pool's
    /// load behavior.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let loaded = File::open(path)
            .ok()
            .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok());

        match loaded {
            Some(set) => set,
            None => {
                tracing::warn!(
                    path = %path.display(),
                    "Used-set file unreadable or corrupt, starting a fresh cycle"
                );
                Self::new()
            }
        }
    }

    /// Save the used-set atomically (write-temp-then-rename)
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
            .with_context(|| format!("Failed to create used-set file: {}", temp_path.display()))?;

        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("Failed to serialize used-set")?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename used-set file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), used = self.used.len(), "Used-set saved");
        Ok(())
    }
}

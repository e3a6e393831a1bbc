// Shared run-level data structures

use serde::Serialize;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Pages fetched successfully during discovery
    pub pages_fetched: usize,

    /// Pages that failed or were blocked
    pub pages_failed: usize,

    /// Raw candidate hrefs seen before normalization
    pub raw_candidates: usize,

    /// Locators newly added to the pool this run
    pub new_locators: usize,

    /// Pool size after discovery
    pub pool_size: usize,

    /// Locators emitted into the feed
    pub selected: usize,

    /// Whether the rotation cycle reset during selection
    pub did_reset: bool,

    /// Whether a feed file was (re)written this run
    pub feed_written: bool,

    /// Entries in the feed after the run (written or preserved)
    pub feed_entries: usize,

    /// Whether discovery hit block/challenge responses
    pub blocked: bool,
}

impl RunSummary {
    /// A usable feed exists after the run
    #[must_use]
    pub fn feed_usable(&self) -> bool {
        self.feed_entries > 0
    }
}

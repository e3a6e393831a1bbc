//! Daily rotation selection over the locator pool
//!
//! This module carves a bounded, non-repeating selection out of the pool:
//! - No locator repeats until the whole pool has been offered once
//!   (the used-set tracks the current cycle; exhaustion resets it)
//! - The order is pseudo-random but deterministic per calendar day, so a
//!   retried run on the same day produces the identical selection
//! - Per-category quotas keep one oversized category from crowding out the
//!   rest
//!
//! Ordering uses a ChaCha8 shuffle seeded from the day number; no
//! wall-clock time-of-day or process randomness enters the selection.

pub mod quota;

use crate::pool::PoolStore;
use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// Derive the deterministic shuffle seed for a calendar date
///
/// Uses `num_days_from_ce()` so every date maps to a unique seed with no
/// year/month/day arithmetic collisions.
#[must_use]
pub fn day_seed(date: NaiveDate) -> u64 {
    date.num_days_from_ce() as u64
}

/// Where the rotation cycle stands once the exhaustion rule is applied
///
/// Modeling the reset as an explicit state (rather than a side effect inside
/// the selection loop) keeps the exhaustion transition independently
/// testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleState {
    /// Enough unoffered locators remain; the cycle continues
    Active {
        /// Locators not yet offered this cycle, sorted
        available: Vec<String>,
        /// Used entries that survived pruning to the pool
        used: BTreeSet<String>,
    },
    /// The cycle wrapped: the used-set is cleared. The unoffered remainder
    /// of the old cycle is served first so every locator is offered before
    /// any repeats; the rest of the pool tops the selection up.
    JustReset {
        /// Locators the old cycle never offered, sorted
        remainder: Vec<String>,
        /// The rest of the pool, sorted
        rest: Vec<String>,
    },
}

/// Apply pruning and the exhaustion rule
///
/// `used` entries not present in `pool` are dropped first. If fewer than
/// `target` locators remain unoffered, the cycle resets: the used-set is
/// cleared and every pool locator becomes eligible again, with the old
/// cycle's unoffered remainder kept in front. A request larger than the
/// pool therefore never starves; it is served the whole pool.
#[must_use]
pub fn resolve_cycle(pool: &[String], used: &BTreeSet<String>, target: usize) -> CycleState {
    let mut all: Vec<String> = pool.to_vec();
    all.sort();
    all.dedup();

    let pruned: BTreeSet<String> = used
        .iter()
        .filter(|u| all.binary_search(*u).is_ok())
        .cloned()
        .collect();

    let (rest, available): (Vec<String>, Vec<String>) =
        all.into_iter().partition(|l| pruned.contains(l));

    if available.len() < target {
        CycleState::JustReset {
            remainder: available,
            rest,
        }
    } else {
        CycleState::Active {
            available,
            used: pruned,
        }
    }
}

/// Result of one selection
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Chosen locators, in emission order
    pub chosen: Vec<String>,

    /// The used-set after this selection (replaces the previous one)
    pub used: BTreeSet<String>,

    /// Whether the exhaustion rule reset the cycle during this selection
    pub did_reset: bool,
}

/// Select up to `target` locators from `pool`, honoring the rotation cycle
///
/// # Arguments
///
/// * `pool` - Every eligible locator (a pool slice or the whole pool)
/// * `used` - Locators already offered this cycle
/// * `target` - Requested selection size
/// * `seed` - Day seed from [`day_seed`]
///
/// # Returns
///
/// The chosen locators (no duplicates, deterministic for a given seed), the
/// replacement used-set, and whether the cycle reset.
#[must_use]
pub fn select(
    pool: &[String],
    used: &BTreeSet<String>,
    target: usize,
    seed: u64,
) -> SelectionOutcome {
    if target == 0 {
        return SelectionOutcome {
            chosen: Vec::new(),
            used: used.clone(),
            did_reset: false,
        };
    }

    if pool.is_empty() {
        return SelectionOutcome {
            chosen: Vec::new(),
            used: BTreeSet::new(),
            did_reset: false,
        };
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    match resolve_cycle(pool, used, target) {
        CycleState::Active {
            mut available,
            mut used,
        } => {
            available.shuffle(&mut rng);
            let chosen: Vec<String> = available.into_iter().take(target).collect();
            used.extend(chosen.iter().cloned());

            SelectionOutcome {
                chosen,
                used,
                did_reset: false,
            }
        }
        CycleState::JustReset {
            mut remainder,
            mut rest,
        } => {
            // The old cycle's leftovers go first; the fresh cycle tops up.
            remainder.shuffle(&mut rng);
            rest.shuffle(&mut rng);

            let need = target.saturating_sub(remainder.len());
            let mut chosen = remainder;
            chosen.extend(rest.into_iter().take(need));

            let used: BTreeSet<String> = chosen.iter().cloned().collect();
            SelectionOutcome {
                chosen,
                used,
                did_reset: true,
            }
        }
    }
}

/// Select across category buckets with fair quotas
///
/// The total target is split into per-bucket quotas (day-rotated remainder,
/// see [`quota::allocate`]); each quota is capped at its bucket size, and
/// any shortfall is dropped rather than redistributed, so an empty category
/// can never cause over-delivery from another. Uncategorized locators form
/// their own bucket, ordered after all named categories. Per-bucket picks
/// run their own rotation cycle against that bucket's slice of the used-set;
/// the concatenated result is re-shuffled with the day seed and truncated to
/// the global target.
#[must_use]
pub fn select_partitioned(
    pool: &PoolStore,
    used: &BTreeSet<String>,
    target: usize,
    seed: u64,
) -> SelectionOutcome {
    let keys = pool.bucket_keys();
    if keys.is_empty() || target == 0 {
        return select(&pool.all(), used, target, seed);
    }

    let quotas = quota::allocate(target, &keys, seed);

    let mut chosen = Vec::new();
    let mut merged_used = BTreeSet::new();
    let mut did_reset = false;

    for key in &keys {
        let bucket = pool.bucket(key.as_deref());
        let quota = quotas.get(key).copied().unwrap_or(0);
        // Shortfall in an undersized bucket is dropped, not redistributed
        let quota = quota.min(bucket.len());

        let slice: BTreeSet<String> = used
            .iter()
            .filter(|u| bucket.binary_search(*u).is_ok())
            .cloned()
            .collect();

        let outcome = select(&bucket, &slice, quota, seed);
        did_reset |= outcome.did_reset;
        chosen.extend(outcome.chosen);
        merged_used.extend(outcome.used);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    chosen.shuffle(&mut rng);

    // Buckets are disjoint so quotas can never overshoot in practice; the
    // truncation guard keeps the contract explicit.
    if chosen.len() > target {
        for dropped in chosen.drain(target..) {
            merged_used.remove(&dropped);
        }
    }

    SelectionOutcome {
        chosen,
        used: merged_used,
        did_reset,
    }
}

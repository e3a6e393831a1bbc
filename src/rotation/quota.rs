//! Per-category quota allocation
//!
//! Splits a total selection target into integer per-category quotas that
//! sum exactly to the target. The remainder after integer division goes to
//! the first `remainder` categories in a day-rotated order, so the same
//! categories do not pocket the extra unit every day.

use std::collections::BTreeMap;

/// Allocate `total` selection slots across `categories`
///
/// Every category receives `total / len`; the remainder is handed out one
/// unit each, starting at offset `day_seed % len` and wrapping. The result
/// always sums exactly to `total`. An empty category list yields an empty
/// map regardless of `total`.
///
/// # Examples
///
/// ```
/// use rotamap::rotation::quota::allocate;
///
/// let cats: Vec<String> = (0..38).map(|i| format!("c{i:02}")).collect();
/// let quotas = allocate(2000, &cats, 7);
/// assert_eq!(quotas.values().sum::<usize>(), 2000);
/// ```
pub fn allocate<K: Clone + Ord>(total: usize, categories: &[K], day_seed: u64) -> BTreeMap<K, usize> {
    let mut quotas = BTreeMap::new();
    if categories.is_empty() {
        return quotas;
    }

    let n = categories.len();
    let base = total / n;
    let remainder = total % n;
    let offset = (day_seed as usize) % n;

    for key in categories {
        quotas.insert(key.clone(), base);
    }

    for i in 0..remainder {
        let key = &categories[(offset + i) % n];
        if let Some(q) = quotas.get_mut(key) {
            *q += 1;
        }
    }

    quotas
}

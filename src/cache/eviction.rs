//! Aging Eviction Module
//!
//! Selects the batch of entries to drop when the store is at capacity.
//! Order is insertion time, not last access.

use std::collections::HashMap;

use crate::cache::{CacheEntry, EVICTION_FRACTION};

// == Batch Size ==
/// Number of entries a batch eviction removes from a map of `len` entries.
///
/// `floor(EVICTION_FRACTION * len)`, but at least one entry whenever the map
/// is non-empty so tiny capacities still make room.
pub fn batch_size(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((len as f64 * EVICTION_FRACTION).floor() as usize).max(1)
}

// == Oldest Keys ==
/// Returns the keys of the `count` oldest entries, oldest first.
///
/// Entries are ordered by `created_at`, ties broken by insertion sequence.
pub fn oldest_keys(entries: &HashMap<String, CacheEntry>, count: usize) -> Vec<String> {
    let mut by_age: Vec<&CacheEntry> = entries.values().collect();
    by_age.sort_by_key(|entry| (entry.created_at, entry.sequence));

    by_age
        .into_iter()
        .take(count)
        .map(|entry| entry.key.clone())
        .collect()
}

//! Cache Store Module
//!
//! Main cache engine: HashMap storage with lazy TTL expiry and batch aging
//! eviction. The store is synchronous and owned by a single writer; see
//! [`crate::cache::MediaCache`] for the shared handle.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{eviction, CacheEntry, CacheStats, Clock, MAX_ENTRIES, TTL_MS};

// == Cache Store ==
/// Key-addressed store of cached images.
#[derive(Debug)]
pub struct CacheStore {
    /// Key to entry storage
    entries: HashMap<String, CacheEntry>,
    /// Running hit/miss/eviction counters
    counters: CacheStats,
    /// Maximum number of entries allowed after an insertion
    max_entries: usize,
    /// Age in milliseconds after which an entry is logically absent
    ttl_ms: u64,
    /// Time source for stamping and expiry
    clock: Arc<dyn Clock>,
    /// Next insertion sequence number
    next_sequence: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `ttl_ms` - Entry lifetime in milliseconds
    /// * `clock` - Time source used for `created_at` and expiry
    pub fn new(max_entries: usize, ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            counters: CacheStats::new(),
            max_entries,
            ttl_ms,
            clock,
            next_sequence: 0,
        }
    }

    /// Creates a store with the standard limits (`MAX_ENTRIES`, `TTL_MS`).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(MAX_ENTRIES, TTL_MS, clock)
    }

    // == Set ==
    /// Stores an entry under `key`, replacing any existing entry.
    ///
    /// If the store is at capacity before the insertion, a batch of the
    /// oldest entries is evicted first. `created_at` is always stamped with
    /// the current time, whatever the caller supplied. Returns the stored
    /// entry as stamped.
    pub fn set(&mut self, key: String, mut entry: CacheEntry) -> CacheEntry {
        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        entry.key = key.clone();
        entry.created_at = self.clock.now_ms();
        entry.sequence = self.next_sequence;
        self.next_sequence += 1;

        debug!("Cache set: key={}, byte_size={}", key, entry.byte_size);
        self.entries.insert(key, entry.clone());
        entry
    }

    // == Get ==
    /// Retrieves an entry by key.
    ///
    /// Returns `None` when the key is absent or the entry has outlived the
    /// TTL; an expired entry is removed as a side effect of the read.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        if self.remove_if_expired(key) {
            self.counters.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.counters.record_hit();
                debug!("Cache hit: key={}", key);
                Some(entry.clone())
            }
            None => {
                self.counters.record_miss();
                debug!("Cache miss: key={}", key);
                None
            }
        }
    }

    // == Has ==
    /// Checks whether a fresh entry exists for `key`.
    ///
    /// Same expiry semantics as [`CacheStore::get`], including removal of an
    /// expired entry. Does not touch the hit/miss counters.
    pub fn has(&mut self, key: &str) -> bool {
        if self.remove_if_expired(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    // == Evict Oldest ==
    /// Removes the oldest `floor(EVICTION_FRACTION * len)` entries (at least
    /// one) by insertion time.
    ///
    /// Returns the number of entries removed.
    pub fn evict_oldest(&mut self) -> usize {
        let count = eviction::batch_size(self.entries.len());
        let victims = eviction::oldest_keys(&self.entries, count);

        for key in &victims {
            self.entries.remove(key);
        }

        self.counters.record_evictions(victims.len());
        info!(
            "Cache eviction: removed {} oldest entries, {} remain",
            victims.len(),
            self.entries.len()
        );
        victims.len()
    }

    // == Clear ==
    /// Removes all entries unconditionally.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        info!("Cache cleared: removed {} entries", removed);
    }

    // == Stats ==
    /// Returns aggregates over the current entries and the running counters.
    ///
    /// Read-only: entries past their TTL but not yet read are still counted.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.counters.clone();
        stats.size = self.entries.len();
        stats.total_bytes = self.entries.values().map(|e| e.byte_size).sum();
        stats.oldest_timestamp = self
            .entries
            .values()
            .map(|e| e.created_at)
            .min()
            .unwrap_or(0);
        stats.newest_timestamp = self
            .entries
            .values()
            .map(|e| e.created_at)
            .max()
            .unwrap_or(0);
        stats
    }

    // == Length ==
    /// Returns the current number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_if_expired(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now, self.ttl_ms));

        if expired {
            self.entries.remove(key);
            debug!("Cache entry expired: key={}", key);
        }
        expired
    }
}

//! Cache Statistics Module
//!
//! Aggregates over the current entries plus running hit, miss and eviction
//! counters.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of the cache contents and performance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries (expired-but-unread entries included)
    pub size: usize,
    /// Sum of `byte_size` over current entries
    pub total_bytes: u64,
    /// Smallest `created_at` among current entries, 0 when empty
    pub oldest_timestamp: u64,
    /// Largest `created_at` among current entries, 0 when empty
    pub newest_timestamp: u64,
    /// Number of reads that returned an entry
    pub hits: u64,
    /// Number of reads that found nothing or an expired entry
    pub misses: u64,
    /// Number of entries removed by batch eviction
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Adds `count` evicted entries to the eviction counter.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }
}

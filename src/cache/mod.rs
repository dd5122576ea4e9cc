//! Cache Module
//!
//! Bounded in-memory store of optimized images with lazy TTL expiry and
//! batch aging eviction.

mod clock;
mod entry;
pub mod eviction;
mod media;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Payload};
pub use media::{locator_of, MediaCache, INLINE_PREFIX};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum number of entries held after any insertion completes
pub const MAX_ENTRIES: usize = 50;

/// Time after which an entry is logically absent (30 minutes)
pub const TTL_MS: u64 = 30 * 60 * 1000;

/// Fraction of the entries dropped by one batch eviction
pub const EVICTION_FRACTION: f64 = 0.2;

/// Width and height recorded when true dimensions are unavailable
pub const PLACEHOLDER_DIMENSION: u32 = 200;

/// Key prefix for profile image slots
pub const PROFILE_KEY_PREFIX: &str = "profile_";

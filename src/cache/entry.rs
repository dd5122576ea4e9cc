//! Cache Entry Module
//!
//! Defines a single cached image result and its payload.

use bytes::Bytes;

// == Payload ==
/// The stored image data.
///
/// The optimizer always produces `Inline` bytes; pass-through insertions
/// (already small images, preloaded resources) store a `Locator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Encoded image bytes held in memory
    Inline(Bytes),
    /// Reference to bytes held elsewhere (URL or `data:` URL)
    Locator(String),
}

impl Payload {
    /// Returns the locator when this payload is a reference.
    pub fn locator(&self) -> Option<&str> {
        match self {
            Payload::Locator(locator) => Some(locator),
            Payload::Inline(_) => None,
        }
    }

    /// Returns the bytes when this payload is held inline.
    pub fn inline(&self) -> Option<&Bytes> {
        match self {
            Payload::Inline(bytes) => Some(bytes),
            Payload::Locator(_) => None,
        }
    }
}

// == Cache Entry ==
/// One cached image result.
///
/// `created_at` is stamped by the store on insertion; any value supplied by
/// the caller is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Key of the logical image slot (e.g. `profile_<ownerId>`)
    pub key: String,
    /// The stored image data
    pub payload: Payload,
    /// Insertion timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Payload size in bytes, 0 when unknown
    pub byte_size: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Insertion order, breaks `created_at` ties during eviction
    pub(crate) sequence: u64,
}

impl CacheEntry {
    // == Constructors ==
    /// Creates an entry holding encoded bytes. `byte_size` is the payload length.
    pub fn inline(bytes: impl Into<Bytes>, width: u32, height: u32) -> Self {
        let bytes = bytes.into();
        let byte_size = bytes.len() as u64;
        Self::with_payload(Payload::Inline(bytes), width, height, byte_size)
    }

    /// Creates an entry referencing externally held bytes.
    pub fn locator(locator: impl Into<String>, width: u32, height: u32, byte_size: u64) -> Self {
        Self::with_payload(Payload::Locator(locator.into()), width, height, byte_size)
    }

    fn with_payload(payload: Payload, width: u32, height: u32, byte_size: u64) -> Self {
        Self {
            key: String::new(),
            payload,
            created_at: 0,
            byte_size,
            width,
            height,
            sequence: 0,
        }
    }

    // == Expiry ==
    /// Returns the entry's age in milliseconds at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    /// Checks whether the entry is older than `ttl_ms` at `now_ms`.
    ///
    /// An entry aged exactly `ttl_ms` is still fresh.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) > ttl_ms
    }
}

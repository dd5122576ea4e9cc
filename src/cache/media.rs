//! Media Cache Handle
//!
//! Shared, cloneable handle over one [`CacheStore`]. Every map mutation runs
//! under the write lock; `stats` takes the read lock.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheStats, CacheStore, Payload, PLACEHOLDER_DIMENSION, PROFILE_KEY_PREFIX,
};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::optimizer::{decode_data_url, mime_type_of, probe_dimensions};

/// Prefix used when wrapping raw base64 as an inline-encoded locator
pub const INLINE_PREFIX: &str = "data:image/jpeg;base64,";

// == Media Cache ==
/// Process-wide image cache, constructed once and cloned into callers.
#[derive(Clone)]
pub struct MediaCache {
    store: Arc<RwLock<CacheStore>>,
    fetcher: Arc<dyn Fetcher>,
}

impl MediaCache {
    /// Wraps a store; `fetcher` serves `preload` for remote locators.
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            fetcher,
        }
    }

    /// Returns the fresh entry for `key`, removing it if expired.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.store.write().await.get(key)
    }

    /// Returns whether a fresh entry exists, removing it if expired.
    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    /// Inserts or replaces the entry for `key`, returning it as stored.
    pub async fn set(&self, key: impl Into<String>, entry: CacheEntry) -> CacheEntry {
        self.store.write().await.set(key.into(), entry)
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Preload ==
    /// Warms the cache for `locator`, storing the locator itself as payload.
    ///
    /// No-op when a fresh entry already exists. `data:` locators are inserted
    /// without a fetch. Remote locators are fetched without holding the lock;
    /// on fetch failure the cache is left unchanged and the error returned.
    /// Concurrent preloads of the same locator are not deduplicated.
    pub async fn preload(&self, locator: &str) -> Result<()> {
        if self.has(locator).await {
            debug!("Preload skipped, already cached: {}", locator);
            return Ok(());
        }

        let entry = if locator.starts_with("data:") {
            inline_locator_entry(locator)
        } else {
            let bytes = self.fetcher.fetch(locator).await.map_err(|e| {
                warn!("Preload failed for {}: {}", locator, e);
                e
            })?;
            let (width, height) = probe_dimensions(&bytes)
                .unwrap_or((PLACEHOLDER_DIMENSION, PLACEHOLDER_DIMENSION));
            CacheEntry::locator(locator, width, height, bytes.len() as u64)
        };

        self.set(locator, entry).await;
        info!("Preloaded {}", truncate_locator(locator));
        Ok(())
    }

    // == Profile Image ==
    /// Returns a displayable locator for an owner's profile picture.
    ///
    /// `None` when no source is supplied. On a miss the source is wrapped as
    /// an inline-encoded locator (unless it already is one) and cached under
    /// `profile_<owner_id>` before returning.
    pub async fn profile_image(&self, owner_id: &str, source: Option<&str>) -> Option<String> {
        let source = source.filter(|s| !s.is_empty())?;
        let key = format!("{PROFILE_KEY_PREFIX}{owner_id}");

        if let Some(entry) = self.get(&key).await {
            return Some(locator_of(&entry.payload));
        }

        let locator = if source.starts_with("data:") {
            source.to_string()
        } else {
            format!("{INLINE_PREFIX}{source}")
        };

        self.set(key, inline_locator_entry(&locator)).await;
        Some(locator)
    }
}

/// Renders a payload as a locator, encoding inline bytes as a `data:` URL
/// labelled with the bytes' own image format.
pub fn locator_of(payload: &Payload) -> String {
    match payload {
        Payload::Locator(locator) => locator.clone(),
        Payload::Inline(bytes) => format!(
            "data:{};base64,{}",
            mime_type_of(bytes),
            STANDARD.encode(bytes)
        ),
    }
}

/// Entry for a `data:` locator, with dimensions taken from the embedded
/// image when it decodes.
fn inline_locator_entry(locator: &str) -> CacheEntry {
    match decode_data_url(locator) {
        Ok(bytes) => {
            let (width, height) = probe_dimensions(&bytes)
                .unwrap_or((PLACEHOLDER_DIMENSION, PLACEHOLDER_DIMENSION));
            CacheEntry::locator(locator, width, height, bytes.len() as u64)
        }
        Err(_) => CacheEntry::locator(locator, PLACEHOLDER_DIMENSION, PLACEHOLDER_DIMENSION, 0),
    }
}

fn truncate_locator(locator: &str) -> &str {
    match locator.char_indices().nth(64) {
        Some((idx, _)) => &locator[..idx],
        None => locator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, TTL_MS};
    use crate::error::MediaError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed bytes and counts calls.
    struct CountingFetcher {
        bytes: Option<Bytes>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn serving(bytes: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                bytes: Some(Bytes::copy_from_slice(bytes)),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                bytes: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, locator: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bytes
                .clone()
                .ok_or_else(|| MediaError::SourceUnreadable(locator.to_string()))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn cache_with(fetcher: Arc<CountingFetcher>) -> (MediaCache, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let store = CacheStore::with_clock(Arc::new(clock.clone()));
        (MediaCache::new(store, fetcher), clock)
    }

    #[tokio::test]
    async fn test_preload_fetches_once() {
        let fetcher = CountingFetcher::serving(&png_bytes(32, 16));
        let (cache, _) = cache_with(fetcher.clone());
        let url = "https://cdn.example.com/avatar.png";

        cache.preload(url).await.unwrap();
        cache.preload(url).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        let entry = cache.get(url).await.unwrap();
        assert_eq!(entry.payload, Payload::Locator(url.to_string()));
        assert_eq!((entry.width, entry.height), (32, 16));
        assert!(entry.byte_size > 0);
    }

    #[tokio::test]
    async fn test_preload_refetches_after_expiry() {
        let fetcher = CountingFetcher::serving(&png_bytes(4, 4));
        let (cache, clock) = cache_with(fetcher.clone());
        let url = "https://cdn.example.com/a.png";

        cache.preload(url).await.unwrap();
        clock.advance(TTL_MS + 1);
        cache.preload(url).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_preload_non_image_uses_placeholder_dimensions() {
        let fetcher = CountingFetcher::serving(b"not an image at all");
        let (cache, _) = cache_with(fetcher);
        let url = "https://cdn.example.com/opaque";

        cache.preload(url).await.unwrap();

        let entry = cache.get(url).await.unwrap();
        assert_eq!((entry.width, entry.height), (200, 200));
    }

    #[tokio::test]
    async fn test_preload_failure_leaves_cache_unchanged() {
        let fetcher = CountingFetcher::failing();
        let (cache, _) = cache_with(fetcher);

        let result = cache.preload("https://cdn.example.com/missing.jpg").await;

        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_preload_inline_skips_fetch() {
        let fetcher = CountingFetcher::failing();
        let (cache, _) = cache_with(fetcher.clone());
        let locator = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(12, 9)));

        cache.preload(&locator).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        let entry = cache.get(&locator).await.unwrap();
        assert_eq!((entry.width, entry.height), (12, 9));
    }

    #[tokio::test]
    async fn test_preload_inline_undecodable_uses_placeholder() {
        let (cache, _) = cache_with(CountingFetcher::failing());
        let locator = "data:image/jpeg;base64,AAAA";

        cache.preload(locator).await.unwrap();

        let entry = cache.get(locator).await.unwrap();
        assert_eq!((entry.width, entry.height), (200, 200));
    }

    #[tokio::test]
    async fn test_profile_image_without_source() {
        let (cache, _) = cache_with(CountingFetcher::failing());

        assert_eq!(cache.profile_image("u1", None).await, None);
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn test_profile_image_wraps_raw_base64() {
        let (cache, _) = cache_with(CountingFetcher::failing());

        let locator = cache.profile_image("u1", Some("QUJD")).await.unwrap();

        assert_eq!(locator, "data:image/jpeg;base64,QUJD");
        let entry = cache.get("profile_u1").await.unwrap();
        assert_eq!(entry.payload, Payload::Locator(locator));
    }

    #[tokio::test]
    async fn test_profile_image_keeps_data_url() {
        let (cache, _) = cache_with(CountingFetcher::failing());
        let source = "data:image/png;base64,QUJD";

        let locator = cache.profile_image("u2", Some(source)).await.unwrap();

        assert_eq!(locator, source);
    }

    #[tokio::test]
    async fn test_profile_image_hit_returns_cached_locator() {
        let (cache, _) = cache_with(CountingFetcher::failing());

        cache.profile_image("u1", Some("Rklyc3Q=")).await;
        let second = cache.profile_image("u1", Some("U2Vjb25k")).await.unwrap();

        assert_eq!(second, "data:image/jpeg;base64,Rklyc3Q=");
    }

    #[tokio::test]
    async fn test_profile_image_inline_payload_rendered_as_data_url() {
        let (cache, _) = cache_with(CountingFetcher::failing());
        cache
            .set("profile_u3", CacheEntry::inline(b"ABC".to_vec(), 1, 1))
            .await;

        let locator = cache.profile_image("u3", Some("ignored")).await.unwrap();

        assert_eq!(locator, "data:image/jpeg;base64,QUJD");
    }

    #[tokio::test]
    async fn test_profile_image_inline_png_keeps_png_label() {
        let (cache, _) = cache_with(CountingFetcher::failing());
        let png = png_bytes(8, 8);
        cache
            .set("profile_u4", CacheEntry::inline(png.clone(), 8, 8))
            .await;

        let locator = cache.profile_image("u4", Some("ignored")).await.unwrap();

        assert_eq!(
            locator,
            format!("data:image/png;base64,{}", STANDARD.encode(&png))
        );
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let (cache, _) = cache_with(CountingFetcher::failing());
        cache.set("a", CacheEntry::locator("a", 1, 1, 0)).await;
        cache.set("b", CacheEntry::locator("b", 1, 1, 0)).await;

        cache.clear().await;

        assert!(!cache.has("a").await);
        assert_eq!(cache.stats().await.size, 0);
    }
}

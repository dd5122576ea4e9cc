//! Two-pass Compression
//!
//! Encodes at `INITIAL_QUALITY`, and once more at `FALLBACK_QUALITY` when the
//! first pass is over budget. No further reduction is attempted.

use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::{MediaError, Result};
use crate::fetch::Fetcher;
use crate::optimizer::{
    fit_square, probe_dimensions, Encoder, ImageSelector, ImageSource, JpegEncoder,
    FALLBACK_QUALITY, INITIAL_QUALITY, MAX_IMAGE_SIZE_INPUT, MAX_SIZE, PASSTHROUGH_QUALITY,
};

// == Budget Status ==
/// Whether a result fits `MAX_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Within,
    /// Both passes ran and the payload is still over budget (soft failure)
    Exceeded,
}

impl BudgetStatus {
    fn of(byte_size: usize) -> Self {
        if byte_size > MAX_SIZE {
            BudgetStatus::Exceeded
        } else {
            BudgetStatus::Within
        }
    }
}

// == Optimization Result ==
/// Encoded output of the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub payload: Bytes,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    /// Quality factor that produced `payload`, 1.0 for pass-through
    pub quality_factor: f32,
    pub budget: BudgetStatus,
}

impl OptimizationResult {
    /// Converts the result into an inline cache entry.
    pub fn into_entry(self) -> CacheEntry {
        CacheEntry::inline(self.payload, self.width, self.height)
    }
}

// == Optimizer ==
/// Produces payloads that fit the byte budget.
///
/// Never touches the cache.
#[derive(Clone)]
pub struct Optimizer {
    fetcher: Arc<dyn Fetcher>,
    encoder: Arc<dyn Encoder>,
}

impl Optimizer {
    /// Creates an optimizer using the JPEG encoder.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_encoder(fetcher, Arc::new(JpegEncoder))
    }

    pub fn with_encoder(fetcher: Arc<dyn Fetcher>, encoder: Arc<dyn Encoder>) -> Self {
        Self { fetcher, encoder }
    }

    // == Optimize ==
    /// Crops, clamps and re-encodes `source`.
    ///
    /// A result over budget after the fallback pass is returned with
    /// [`BudgetStatus::Exceeded`] rather than as an error.
    pub async fn optimize(
        &self,
        source: &ImageSource,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let bytes = self.read(source, cancel).await?;
        self.compress(bytes, cancel).await
    }

    // == Validate And Optimize ==
    /// Returns sources already within `MAX_SIZE` untouched, with quality 1.0;
    /// delegates everything else to the two-pass compression.
    pub async fn validate_and_optimize(
        &self,
        source: &ImageSource,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let bytes = self.read(source, cancel).await?;

        if bytes.len() > MAX_SIZE {
            return self.compress(bytes, cancel).await;
        }

        let (width, height) = probe_dimensions(&bytes).ok_or_else(|| {
            MediaError::SourceUnreadable("unrecognized image format".to_string())
        })?;
        debug!("Pass-through: {} bytes, {}x{}", bytes.len(), width, height);

        Ok(OptimizationResult {
            byte_size: bytes.len() as u64,
            payload: bytes,
            width,
            height,
            quality_factor: PASSTHROUGH_QUALITY,
            budget: BudgetStatus::Within,
        })
    }

    // == Select And Optimize ==
    /// Runs the interactive picker, then [`Optimizer::validate_and_optimize`]
    /// on the chosen source. Dismissing the picker is `SelectionCancelled`.
    pub async fn select_and_optimize(
        &self,
        selector: &dyn ImageSelector,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult> {
        let selected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MediaError::SelectionCancelled),
            selected = selector.select() => selected?,
        };

        let source = selected.ok_or(MediaError::SelectionCancelled)?;
        self.validate_and_optimize(&source, cancel).await
    }

    async fn read(&self, source: &ImageSource, cancel: &CancellationToken) -> Result<Bytes> {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MediaError::SelectionCancelled),
            bytes = source.read(self.fetcher.as_ref()) => bytes?,
        };

        if bytes.len() > MAX_IMAGE_SIZE_INPUT {
            return Err(MediaError::InputTooLarge {
                size: bytes.len(),
                limit: MAX_IMAGE_SIZE_INPUT,
            });
        }
        Ok(bytes)
    }

    async fn compress(&self, bytes: Bytes, cancel: &CancellationToken) -> Result<OptimizationResult> {
        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes)
                .map(|decoded| fit_square(&decoded))
                .map_err(|e| MediaError::SourceUnreadable(e.to_string()))
        })
        .await
        .map_err(|e| MediaError::SourceUnreadable(format!("decode task failed: {e}")))??;
        let image = Arc::new(image);

        let mut quality = INITIAL_QUALITY;
        let mut encoded = self.encode(image.clone(), quality, cancel).await?;

        if encoded.len() > MAX_SIZE {
            debug!(
                "First pass {} bytes over {} byte budget, retrying at {}",
                encoded.len(),
                MAX_SIZE,
                FALLBACK_QUALITY
            );
            quality = FALLBACK_QUALITY;
            encoded = self.encode(image.clone(), quality, cancel).await?;
        }

        let budget = BudgetStatus::of(encoded.len());
        if budget == BudgetStatus::Exceeded {
            warn!(
                "Optimized image still {} bytes after fallback pass (budget {})",
                encoded.len(),
                MAX_SIZE
            );
        }

        Ok(OptimizationResult {
            byte_size: encoded.len() as u64,
            payload: Bytes::from(encoded),
            width: image.width(),
            height: image.height(),
            quality_factor: quality,
            budget,
        })
    }

    async fn encode(
        &self,
        image: Arc<DynamicImage>,
        quality: f32,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(MediaError::SelectionCancelled);
        }

        let encoder = self.encoder.clone();
        let encoded = tokio::task::spawn_blocking(move || encoder.encode(&image, quality))
            .await
            .map_err(|e| MediaError::EncodeFailed(format!("encode task failed: {e}")))??;

        debug!("Encoded at quality {}: {} bytes", quality, encoded.len());
        Ok(encoded)
    }
}

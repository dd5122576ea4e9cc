//! Media Pipeline
//!
//! Cache probe, optimize on miss, insert, return.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheEntry, MediaCache};
use crate::error::Result;
use crate::optimizer::{BudgetStatus, ImageSource, Optimizer};

/// Outcome of one pipeline request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub entry: CacheEntry,
    /// True when the entry was already cached and fresh
    pub cached: bool,
    /// Quality factor of a fresh optimization, `None` on a cache hit
    pub quality_factor: Option<f32>,
    pub budget: Option<BudgetStatus>,
}

/// Composes the cache and the optimizer.
#[derive(Clone)]
pub struct MediaPipeline {
    cache: MediaCache,
    optimizer: Optimizer,
}

impl MediaPipeline {
    pub fn new(cache: MediaCache, optimizer: Optimizer) -> Self {
        Self { cache, optimizer }
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    pub fn optimizer(&self) -> &Optimizer {
        &self.optimizer
    }

    /// Returns the cached entry for `key`, or optimizes `source` and caches it.
    ///
    /// Optimizer errors propagate and leave the cache unchanged.
    pub async fn fetch_or_optimize(
        &self,
        key: &str,
        source: &ImageSource,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput> {
        if let Some(entry) = self.cache.get(key).await {
            return Ok(PipelineOutput {
                entry,
                cached: true,
                quality_factor: None,
                budget: None,
            });
        }

        let result = self.optimizer.validate_and_optimize(source, cancel).await?;
        let quality_factor = result.quality_factor;
        let budget = result.budget;
        debug!(
            "Optimized {}: {} bytes at quality {}",
            key, result.byte_size, quality_factor
        );

        let entry = self.cache.set(key, result.into_entry()).await;

        Ok(PipelineOutput {
            entry,
            cached: false,
            quality_factor: Some(quality_factor),
            budget: Some(budget),
        })
    }
}

//! API Handlers
//!
//! HTTP request handlers for each media cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheEntry, CacheStore, Clock, MediaCache, SystemClock};
use crate::config::Config;
use crate::error::{MediaError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::models::{
    validate_key, ClearResponse, ExistsResponse, HealthResponse, MediaResponse, OptimizeRequest,
    OptimizeResponse, PreloadRequest, PreloadResponse, ProfileImageRequest, ProfileImageResponse,
    SetMediaRequest, StatsResponse,
};
use crate::optimizer::{ImageSource, Optimizer};
use crate::pipeline::MediaPipeline;

/// Application state shared across all handlers.
///
/// Holds the one pipeline (and through it the one cache) for the process.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: MediaPipeline,
}

impl AppState {
    /// Creates a new AppState around an existing pipeline.
    pub fn new(pipeline: MediaPipeline) -> Self {
        Self { pipeline }
    }

    /// Builds the cache and optimizer over a shared fetcher and clock.
    pub fn with_parts(fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        let cache = MediaCache::new(CacheStore::with_clock(clock), fetcher.clone());
        Self::new(MediaPipeline::new(cache, Optimizer::new(fetcher)))
    }

    /// Creates a new AppState from configuration, using HTTP fetching and
    /// the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout())?;
        Ok(Self::with_parts(Arc::new(fetcher), Arc::new(SystemClock)))
    }

    pub fn cache(&self) -> &MediaCache {
        self.pipeline.cache()
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(MediaError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for GET /media/:key
pub async fn get_media_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MediaResponse>> {
    let entry = state
        .cache()
        .get(&key)
        .await
        .ok_or(MediaError::NotFound(key))?;

    Ok(Json(MediaResponse::from(&entry)))
}

/// Handler for GET /media/:key/exists
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let present = state.cache().has(&key).await;
    Json(ExistsResponse { key, present })
}

/// Handler for PUT /media/:key
///
/// Stores a locator payload without optimization.
pub async fn set_media_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetMediaRequest>,
) -> Result<Json<MediaResponse>> {
    check_key(&key)?;
    if let Some(error_msg) = req.validate() {
        return Err(MediaError::InvalidRequest(error_msg));
    }

    let entry = CacheEntry::locator(req.locator, req.width, req.height, req.byte_size);
    let stored = state.cache().set(key, entry).await;

    Ok(Json(MediaResponse::from(&stored)))
}

/// Handler for POST /media/:key/optimize
///
/// Runs the cache-then-optimize pipeline. Dropping the request (client
/// disconnect) cancels an in-flight optimization.
pub async fn optimize_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>> {
    check_key(&key)?;
    if req.source.is_empty() {
        return Err(MediaError::InvalidRequest("Source cannot be empty".to_string()));
    }

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let source = ImageSource::Locator(req.source);

    let output = state
        .pipeline
        .fetch_or_optimize(&key, &source, &cancel)
        .await;
    guard.disarm();

    Ok(Json(OptimizeResponse::from(&output?)))
}

/// Handler for POST /preload
pub async fn preload_handler(
    State(state): State<AppState>,
    Json(req): Json<PreloadRequest>,
) -> Result<Json<PreloadResponse>> {
    if req.locator.is_empty() {
        return Err(MediaError::InvalidRequest("Locator cannot be empty".to_string()));
    }

    state.cache().preload(&req.locator).await?;

    Ok(Json(PreloadResponse {
        locator: req.locator,
        cached: true,
    }))
}

/// Handler for POST /profiles/:owner_id/image
pub async fn profile_image_handler(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    Json(req): Json<ProfileImageRequest>,
) -> Json<ProfileImageResponse> {
    let locator = state
        .cache()
        .profile_image(&owner_id, req.source.as_deref())
        .await;

    Json(ProfileImageResponse { owner_id, locator })
}

/// Handler for DELETE /media
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache().clear().await;
    Json(ClearResponse::new())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache().stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

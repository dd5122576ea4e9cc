//! API Routes
//!
//! Configures the Axum router with all media cache endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::optimizer::MAX_IMAGE_SIZE_INPUT;

use super::handlers::{
    clear_handler, exists_handler, get_media_handler, health_handler, optimize_handler,
    preload_handler, profile_image_handler, set_media_handler, stats_handler, AppState,
};

/// Large enough for a base64 data URL of a maximum-size input.
const MAX_BODY_BYTES: usize = MAX_IMAGE_SIZE_INPUT * 2;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /media/:key` - Retrieve a cached entry
/// - `PUT /media/:key` - Store a locator payload
/// - `GET /media/:key/exists` - Check for a fresh entry
/// - `POST /media/:key/optimize` - Cached or freshly optimized image for a source
/// - `DELETE /media` - Clear the cache
/// - `POST /preload` - Warm the cache for a locator
/// - `POST /profiles/:owner_id/image` - Profile image locator
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/media", delete(clear_handler))
        .route("/media/:key", get(get_media_handler).put(set_media_handler))
        .route("/media/:key/exists", get(exists_handler))
        .route("/media/:key/optimize", post(optimize_handler))
        .route("/preload", post(preload_handler))
        .route("/profiles/:owner_id/image", post(profile_image_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

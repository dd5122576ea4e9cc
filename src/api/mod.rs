//! API Module
//!
//! HTTP handlers and routing exposing the media cache and optimization
//! pipeline.
//!
//! # Endpoints
//! - `GET /media/:key`, `PUT /media/:key`, `GET /media/:key/exists`
//! - `POST /media/:key/optimize` - Cache-then-optimize pipeline
//! - `DELETE /media` - Clear the cache
//! - `POST /preload`, `POST /profiles/:owner_id/image`
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! Request and Response models for the media cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    validate_key, OptimizeRequest, PreloadRequest, ProfileImageRequest, SetMediaRequest,
};
pub use responses::{
    ClearResponse, ExistsResponse, HealthResponse, MediaResponse, OptimizeResponse,
    PreloadResponse, ProfileImageResponse, StatsResponse,
};

//! Request DTOs for the media cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::PLACEHOLDER_DIMENSION;

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Validates a cache key taken from a request path.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for a pass-through insertion (PUT /media/:key)
#[derive(Debug, Clone, Deserialize)]
pub struct SetMediaRequest {
    /// Locator stored as the payload
    pub locator: String,
    #[serde(default = "placeholder_dimension")]
    pub width: u32,
    #[serde(default = "placeholder_dimension")]
    pub height: u32,
    /// Payload size, 0 when unknown
    #[serde(default)]
    pub byte_size: u64,
}

fn placeholder_dimension() -> u32 {
    PLACEHOLDER_DIMENSION
}

impl SetMediaRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.locator.is_empty() {
            return Some("Locator cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /media/:key/optimize
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    /// `http(s)://` URL or base64 `data:` URL of the raw image
    pub source: String,
}

/// Request body for POST /media/preload
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadRequest {
    pub locator: String,
}

/// Request body for POST /profiles/:owner_id/image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileImageRequest {
    /// Raw base64 or `data:` URL; absent when the owner has no picture
    #[serde(default)]
    pub source: Option<String>,
}

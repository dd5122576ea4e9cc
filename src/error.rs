//! Error types for the media cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Media Error Enum ==
/// Unified error type for the cache and the optimization pipeline.
///
/// Exceeding the size budget after both compression passes is not an error;
/// see [`crate::optimizer::BudgetStatus`].
#[derive(Error, Debug)]
pub enum MediaError {
    /// Fetching, reading or decoding the source failed
    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    /// Interactive selection was dismissed or the caller cancelled
    #[error("Selection cancelled")]
    SelectionCancelled,

    /// Re-encoding the image failed
    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    /// Raw input is larger than the accepted input limit
    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = match &self {
            MediaError::SourceUnreadable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MediaError::SelectionCancelled => StatusCode::CONFLICT,
            MediaError::EncodeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MediaError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            MediaError::NotFound(_) => StatusCode::NOT_FOUND,
            MediaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the media cache.
pub type Result<T> = std::result::Result<T, MediaError>;

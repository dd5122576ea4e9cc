//! Response DTOs for the media cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats, Payload};
use crate::optimizer::mime_type_of;
use crate::optimizer::BudgetStatus;
use crate::pipeline::PipelineOutput;

/// Serialized payload; inline bytes are standard base64
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadBody {
    Inline { mime_type: String, data: String },
    Locator { locator: String },
}

impl From<&Payload> for PayloadBody {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Inline(bytes) => PayloadBody::Inline {
                mime_type: mime_type_of(bytes).to_string(),
                data: STANDARD.encode(bytes),
            },
            Payload::Locator(locator) => PayloadBody::Locator {
                locator: locator.clone(),
            },
        }
    }
}

/// Response body for GET /media/:key and PUT /media/:key
#[derive(Debug, Clone, Serialize)]
pub struct MediaResponse {
    pub key: String,
    pub payload: PayloadBody,
    pub created_at: u64,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
}

impl From<&CacheEntry> for MediaResponse {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            payload: PayloadBody::from(&entry.payload),
            created_at: entry.created_at,
            byte_size: entry.byte_size,
            width: entry.width,
            height: entry.height,
        }
    }
}

/// Response body for POST /media/:key/optimize
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    #[serde(flatten)]
    pub media: MediaResponse,
    /// True when served from the cache without optimizing
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_factor: Option<f32>,
    /// True when both passes ran and the payload is still over budget
    pub budget_exceeded: bool,
}

impl From<&PipelineOutput> for OptimizeResponse {
    fn from(output: &PipelineOutput) -> Self {
        Self {
            media: MediaResponse::from(&output.entry),
            cached: output.cached,
            quality_factor: output.quality_factor,
            budget_exceeded: output.budget == Some(BudgetStatus::Exceeded),
        }
    }
}

/// Response body for GET /media/:key/exists
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub present: bool,
}

/// Response body for POST /preload
#[derive(Debug, Clone, Serialize)]
pub struct PreloadResponse {
    pub locator: String,
    pub cached: bool,
}

/// Response body for POST /profiles/:owner_id/image
#[derive(Debug, Clone, Serialize)]
pub struct ProfileImageResponse {
    pub owner_id: String,
    /// Displayable locator, null when no source was supplied
    pub locator: Option<String>,
}

/// Response body for DELETE /media
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_payload_serialized_as_base64() {
        let entry = CacheEntry::inline(b"ABC".to_vec(), 1, 2);
        let json = serde_json::to_value(MediaResponse::from(&entry)).unwrap();

        assert_eq!(json["payload"]["kind"], "inline");
        assert_eq!(json["payload"]["data"], "QUJD");
        assert_eq!(json["payload"]["mime_type"], "image/jpeg");
        assert_eq!(json["byte_size"], 3);
    }

    #[test]
    fn test_locator_payload_serialized() {
        let entry = CacheEntry::locator("https://cdn.example.com/a.jpg", 200, 200, 0);
        let json = serde_json::to_value(MediaResponse::from(&entry)).unwrap();

        assert_eq!(json["payload"]["kind"], "locator");
        assert_eq!(json["payload"]["locator"], "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_stats_response_flattens() {
        let mut stats = CacheStats::new();
        stats.size = 2;
        stats.record_hit();
        stats.record_miss();

        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();
        assert_eq!(json["size"], 2);
        assert_eq!(json["hit_rate"], 0.5);
        assert_eq!(json["oldest_timestamp"], 0);
    }

    #[test]
    fn test_optimize_response_flags_budget() {
        let output = PipelineOutput {
            entry: CacheEntry::inline(vec![0u8; 4], 800, 800),
            cached: false,
            quality_factor: Some(0.3),
            budget: Some(BudgetStatus::Exceeded),
        };

        let json = serde_json::to_value(OptimizeResponse::from(&output)).unwrap();
        assert_eq!(json["budget_exceeded"], true);
        assert_eq!(json["cached"], false);
        assert_eq!(json["width"], 800);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}

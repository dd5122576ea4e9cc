//! Media Cache - A bounded in-memory image cache with a size-constrained
//! optimization pipeline
//!
//! Optimized images are cached by key with a 30 minute TTL (expired lazily on
//! read) and batch eviction of the oldest entries at capacity.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod optimizer;
pub mod pipeline;

pub use api::AppState;
pub use cache::MediaCache;
pub use config::Config;
pub use error::{MediaError, Result};
pub use optimizer::Optimizer;
pub use pipeline::MediaPipeline;

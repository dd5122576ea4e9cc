//! Optimizer Module
//!
//! Re-encodes source images so they fit the byte budget before they are
//! cached or transmitted.

mod compress;
mod encoder;
mod source;

pub use compress::{BudgetStatus, OptimizationResult, Optimizer};
pub use encoder::{fit_square, Encoder, JpegEncoder};
pub use source::{decode_data_url, mime_type_of, probe_dimensions, ImageSelector, ImageSource};

// == Public Constants ==
/// Byte budget every optimized payload aims for (500 KB)
pub const MAX_SIZE: usize = 500 * 1024;

/// Raw inputs above this size are rejected before decoding (2 MB)
pub const MAX_IMAGE_SIZE_INPUT: usize = 2 * 1024 * 1024;

/// Maximum output width in pixels
pub const MAX_WIDTH: u32 = 800;

/// Maximum output height in pixels
pub const MAX_HEIGHT: u32 = 800;

/// Quality factor of the first encode pass
pub const INITIAL_QUALITY: f32 = 0.7;

/// Quality factor of the single fallback pass
pub const FALLBACK_QUALITY: f32 = 0.3;

/// Quality factor reported for untouched pass-through sources
pub const PASSTHROUGH_QUALITY: f32 = 1.0;

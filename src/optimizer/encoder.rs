//! Encoder Module
//!
//! Square cropping, dimension clamping and quality-controlled re-encoding.

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};

use crate::error::{MediaError, Result};
use crate::optimizer::{MAX_HEIGHT, MAX_WIDTH};

/// Encodes an image at a quality factor in `(0, 1]`.
///
/// Runs on a blocking thread, so implementations must not block on async work.
pub trait Encoder: Send + Sync {
    fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>>;
}

// == JPEG Encoder ==
/// Baseline JPEG encoder from the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

impl Encoder for JpegEncoder {
    fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();

        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality_percent(quality))
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| MediaError::EncodeFailed(e.to_string()))?;

        Ok(buf)
    }
}

/// Maps a quality factor to the encoder's 1..=100 scale.
fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

// == Geometry ==
/// Center-crops to a square and downscales to at most `MAX_WIDTH x MAX_HEIGHT`.
///
/// Images smaller than the limit are never upscaled.
pub fn fit_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    let cropped = image.crop_imm((width - side) / 2, (height - side) / 2, side, side);

    let target = MAX_WIDTH.min(MAX_HEIGHT);
    if side > target {
        cropped.resize_exact(target, target, FilterType::Lanczos3)
    } else {
        cropped
    }
}

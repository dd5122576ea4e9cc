//! Image Sources
//!
//! Where raw image bytes come from, and the interactive picker seam.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use image::ImageFormat;

use crate::error::{MediaError, Result};
use crate::fetch::{is_remote, Fetcher};

// == Image Source ==
/// A raw image handed to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `http(s)://` URL or `data:` URL
    Locator(String),
    /// File on the local filesystem
    Path(PathBuf),
    /// Bytes already in memory
    Inline(Bytes),
}

impl ImageSource {
    /// Reads the raw bytes behind this source.
    pub(crate) async fn read(&self, fetcher: &dyn Fetcher) -> Result<Bytes> {
        match self {
            ImageSource::Inline(bytes) => Ok(bytes.clone()),
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| MediaError::SourceUnreadable(format!("{}: {e}", path.display()))),
            ImageSource::Locator(locator) if locator.starts_with("data:") => {
                decode_data_url(locator)
            }
            ImageSource::Locator(locator) if is_remote(locator) => fetcher.fetch(locator).await,
            ImageSource::Locator(locator) => Err(MediaError::SourceUnreadable(format!(
                "unsupported locator: {locator}"
            ))),
        }
    }
}

// == Image Selector ==
/// Interactive picker supplying a source chosen by the user.
#[async_trait]
pub trait ImageSelector: Send + Sync {
    /// Returns `Ok(None)` when the user dismissed the picker.
    async fn select(&self) -> Result<Option<ImageSource>>;
}

// == Data URLs ==
/// Decodes the bytes embedded in a base64 `data:` URL.
pub fn decode_data_url(locator: &str) -> Result<Bytes> {
    let rest = locator
        .strip_prefix("data:")
        .ok_or_else(|| MediaError::SourceUnreadable("not a data URL".to_string()))?;

    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| MediaError::SourceUnreadable("data URL without payload".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(MediaError::SourceUnreadable(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(cleaned)
        .map(Bytes::from)
        .map_err(|e| MediaError::SourceUnreadable(format!("invalid base64: {e}")))
}

// == Dimensions ==
/// Reads width and height from the image header without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

// == Format ==
/// MIME type of encoded image bytes, sniffed from the magic number.
///
/// Falls back to `image/jpeg`, the optimizer's output format.
pub fn mime_type_of(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Ico) => "image/x-icon",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFetch;

    #[async_trait]
    impl Fetcher for NoFetch {
        async fn fetch(&self, locator: &str) -> Result<Bytes> {
            Err(MediaError::SourceUnreadable(locator.to_string()))
        }
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = decode_data_url("data:image/jpeg;base64,QUJD").unwrap();
        assert_eq!(&bytes[..], b"ABC");
    }

    #[test]
    fn test_decode_data_url_ignores_line_breaks() {
        let bytes = decode_data_url("data:image/png;base64,QU\nJD").unwrap();
        assert_eq!(&bytes[..], b"ABC");
    }

    #[test]
    fn test_decode_data_url_rejects_plain_encoding() {
        let result = decode_data_url("data:text/plain,hello");
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }

    #[test]
    fn test_decode_data_url_rejects_bad_base64() {
        let result = decode_data_url("data:image/png;base64,!!!");
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }

    #[test]
    fn test_probe_dimensions() {
        let img = image::RgbImage::new(31, 17);
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(probe_dimensions(&buf), Some((31, 17)));
        assert_eq!(probe_dimensions(b"garbage"), None);
    }

    #[test]
    fn test_mime_type_of() {
        let img = image::RgbImage::new(4, 4);
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(mime_type_of(&png), "image/png");
        assert_eq!(mime_type_of(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(mime_type_of(b"GIF89a....."), "image/gif");
        assert_eq!(mime_type_of(b"unknown"), "image/jpeg");
    }

    #[tokio::test]
    async fn test_read_inline_and_data_url() {
        let inline = ImageSource::Inline(Bytes::from_static(b"xyz"));
        assert_eq!(&inline.read(&NoFetch).await.unwrap()[..], b"xyz");

        let data = ImageSource::Locator("data:image/jpeg;base64,QUJD".to_string());
        assert_eq!(&data.read(&NoFetch).await.unwrap()[..], b"ABC");
    }

    #[tokio::test]
    async fn test_read_unsupported_scheme() {
        let source = ImageSource::Locator("ftp://example.com/a.jpg".to_string());
        let result = source.read(&NoFetch).await;
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }

    #[tokio::test]
    async fn test_read_missing_path() {
        let source = ImageSource::Path(PathBuf::from("/nonexistent/media_cache/a.jpg"));
        let result = source.read(&NoFetch).await;
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }
}

//! Remote Fetch Module
//!
//! Retrieves image bytes for `http(s)://` locators.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{MediaError, Result};
use crate::optimizer::MAX_IMAGE_SIZE_INPUT;

/// Fetches the bytes a locator points to.
///
/// Implementations must be thread-safe; the cache and optimizer share one.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads the resource at `locator`.
    ///
    /// Any transport or HTTP-level failure is reported as
    /// [`MediaError::SourceUnreadable`]; a body over the size limit as
    /// [`MediaError::InputTooLarge`].
    async fn fetch(&self, locator: &str) -> Result<Bytes>;
}

// == HTTP Fetcher ==
/// `reqwest`-backed fetcher for remote image locators.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    /// Largest body accepted, in bytes
    max_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests time out after `timeout` and whose
    /// bodies are capped at `MAX_IMAGE_SIZE_INPUT`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("media_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediaError::SourceUnreadable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_SIZE_INPUT,
        })
    }

    /// Overrides the body size cap.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, locator: &str, size: usize) -> MediaError {
        warn!(
            "Rejected {}: body of at least {} bytes exceeds {} byte limit",
            locator, size, self.max_bytes
        );
        MediaError::InputTooLarge {
            size,
            limit: self.max_bytes,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<Bytes> {
        debug!("Fetching {}", locator);

        let mut response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| MediaError::SourceUnreadable(format!("{locator}: {e}")))?;

        if !response.status().is_success() {
            return Err(MediaError::SourceUnreadable(format!(
                "{locator}: HTTP {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.is_empty() && !content_type.starts_with("image/") {
            return Err(MediaError::SourceUnreadable(format!(
                "{locator}: not an image ({content_type})"
            )));
        }

        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_bytes {
                return Err(self.too_large(locator, length));
            }
        }

        // Running total enforces the cap when Content-Length is absent
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::SourceUnreadable(format!("{locator}: {e}")))?
        {
            let received = body.len() + chunk.len();
            if received > self.max_bytes {
                return Err(self.too_large(locator, received));
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), locator);
        Ok(body.freeze())
    }
}

/// Returns true for locators the [`Fetcher`] is responsible for.
pub fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers one request on a local port with `response`, returning its URL.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/image.jpg")
    }

    fn image_response(body_len: usize, with_length: bool) -> Vec<u8> {
        let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\n".to_vec();
        if with_length {
            response.extend_from_slice(format!("Content-Length: {body_len}\r\n").as_bytes());
        }
        response.extend_from_slice(b"Connection: close\r\n\r\n");
        response.extend(std::iter::repeat(0xFFu8).take(body_len));
        response
    }

    fn fetcher(max_bytes: usize) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_max_bytes(max_bytes)
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/a.jpg"));
        assert!(is_remote("http://localhost/a.png"));
        assert!(!is_remote("data:image/jpeg;base64,AAAA"));
        assert!(!is_remote("/tmp/a.jpg"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_source_unreadable() {
        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();

        let result = fetcher.fetch("http://127.0.0.1:9/missing.jpg").await;
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }

    #[tokio::test]
    async fn test_fetch_within_limit() {
        let url = serve_once(image_response(512, true)).await;

        let bytes = fetcher(1024).fetch(&url).await.unwrap();
        assert_eq!(bytes.len(), 512);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_rejected() {
        let url = serve_once(image_response(64 * 1024, true)).await;

        let result = fetcher(1024).fetch(&url).await;
        assert!(matches!(
            result,
            Err(MediaError::InputTooLarge { size, limit }) if size == 64 * 1024 && limit == 1024
        ));
    }

    #[tokio::test]
    async fn test_undeclared_body_over_limit_rejected() {
        let url = serve_once(image_response(64 * 1024, false)).await;

        let result = fetcher(1024).fetch(&url).await;
        assert!(matches!(
            result,
            Err(MediaError::InputTooLarge { size, limit }) if size > 1024 && limit == 1024
        ));
    }

    #[tokio::test]
    async fn test_default_limit_is_input_limit() {
        let url = serve_once(image_response(MAX_IMAGE_SIZE_INPUT + 1, false)).await;

        let result = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .fetch(&url)
            .await;
        assert!(matches!(result, Err(MediaError::InputTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_non_image_content_type_rejected() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi"
                .to_vec(),
        )
        .await;

        let result = fetcher(1024).fetch(&url).await;
        assert!(matches!(result, Err(MediaError::SourceUnreadable(_))));
    }
}

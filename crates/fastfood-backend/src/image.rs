//! Fetching external images for re-upload.

use std::time::Duration;

use async_trait::async_trait;
use fastfood_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Downloaded image bytes and the content type the server declared.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Source of image bytes by URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

/// Plain HTTP GET image source.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let fetch_error = |message: String| Error::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
            .to_vec();

        debug!("Fetched {} ({} bytes, {:?})", url, bytes.len(), content_type);
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// A 1x1 transparent PNG.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// Offline image source: every URL yields the same placeholder PNG.
/// Used for dry runs so nothing is downloaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderImageSource;

#[async_trait]
impl ImageSource for PlaceholderImageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        debug!("Placeholder image for {}", url);
        Ok(FetchedImage {
            bytes: PLACEHOLDER_PNG.to_vec(),
            content_type: Some("image/png".into()),
        })
    }
}

/// Pick the upload content type: the declared one, else a guess from the
/// file name, else `application/octet-stream`.
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    if let Some(ct) = declared.map(str::trim).filter(|ct| !ct.is_empty()) {
        return ct.to_string();
    }
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_content_type_wins() {
        assert_eq!(resolve_content_type(Some("image/webp"), "a.png"), "image/webp");
    }

    #[test]
    fn test_guess_from_file_name() {
        assert_eq!(resolve_content_type(None, "burger.png"), "image/png");
        assert_eq!(resolve_content_type(Some("  "), "burger.jpg"), "image/jpeg");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            resolve_content_type(None, "burger"),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_placeholder_needs_no_network() {
        // Port 9 is closed; the placeholder source never connects.
        let image = PlaceholderImageSource
            .fetch("http://127.0.0.1:9/a.jpg")
            .await
            .unwrap();
        assert!(image.bytes.starts_with(b"\x89PNG"));
        assert_eq!(image.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_fetch_error() {
        let source = HttpImageSource::new().unwrap();
        let err = source.fetch("http://127.0.0.1:9/a.jpg").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        assert!(err.is_retryable());
    }
}

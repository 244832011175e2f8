//! Remote image fetcher

use reqwest::{header, Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::media::{essence, guess_from_extension, ImagePayload, DEFAULT_IMAGE_TYPE};

/// Downloads images over HTTP(S) into [`ImagePayload`]s
#[derive(Clone)]
pub struct RemoteImageFetcher {
    client: Client,
}

impl RemoteImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Issue an uncached GET and resolve the media type of the body.
    ///
    /// Resolution order: response `Content-Type` without parameters, then the
    /// URL path's extension, then `image/png`.
    pub async fn fetch(&self, url: &str) -> Result<ImagePayload> {
        let response = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("fetching {}", url))
                } else {
                    AppError::upstream_fetch(url, None, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream_fetch(
                url,
                Some(status.as_u16()),
                format!("upstream returned {}", status),
            ));
        }

        let header_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| essence(v).to_string())
            .filter(|v| !v.is_empty());

        let media_type = header_type.unwrap_or_else(|| {
            Url::parse(url)
                .ok()
                .and_then(|u| guess_from_extension(u.path()))
                .unwrap_or(DEFAULT_IMAGE_TYPE)
                .to_string()
        });

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::upstream_fetch(url, Some(status.as_u16()), e.to_string()))?;

        debug!(url = %url, media_type = %media_type, size = bytes.len(), "Fetched remote image");

        Ok(ImagePayload::new(bytes.to_vec(), media_type))
    }
}

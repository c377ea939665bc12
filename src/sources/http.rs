//! Image prefetching over HTTP.

use std::time::Duration;

use tracing::debug;

use super::{ImageFetcher, SourceError};

/// Downloads images with a shared `reqwest` client.
///
/// The body is read to completion so the request only succeeds when the
/// whole image arrived; storing it is left to the platform's image cache.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Http`](crate::PulseError::Http) if the HTTP
    /// client cannot be built.
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, err: &reqwest::Error) -> SourceError {
    SourceError::Fetch {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<(), SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_error(url, &e))?;
        let body = response.bytes().await.map_err(|e| fetch_error(url, &e))?;
        debug!(url, bytes = body.len(), "prefetched image");

        Ok(())
    }
}

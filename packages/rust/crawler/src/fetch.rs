//! HTTP implementation of [`PageFetcher`].

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::debug;

use manualsync_shared::{FetchError, ManualSyncError, PageFetcher, Result, RunConfig};

/// Maximum number of redirects to follow per request.
const MAX_REDIRECTS: usize = 5;

/// Fetches pages with a shared reqwest client.
///
/// Requests carry `Accept: */*` and nothing else: the manual's server rejects
/// requests that look like they come from a browser.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ManualSyncError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(config.timeout_secs)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(url, status.as_u16(), &body));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, format!("failed to read body: {e}")))
    }
}

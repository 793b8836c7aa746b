//! The page-fetching capability.

use std::future::Future;

use crate::error::FetchError;

/// Fetches the HTML body of a page.
///
/// Implemented over HTTP by the crawler crate and by in-memory fakes in tests.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

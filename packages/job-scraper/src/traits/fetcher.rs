//! Page fetcher trait.

use async_trait::async_trait;
use url::Url;

use crate::error::FetchResult;

/// Returns the document body for a URL.
///
/// Implementations perform a single plain `GET` with a bounded timeout.
/// They do not render JavaScript and do not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url`.
    async fn fetch(&self, url: &Url) -> FetchResult<String>;

    /// Fetcher name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

//! Rate-limited fetcher wrapper.
//!
//! Wraps any [`PageFetcher`] so that successive requests through it are at
//! least a fixed gap apart, using the governor crate.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::FetchResult;
use crate::traits::fetcher::PageFetcher;

/// Minimum gap between requests of one source.
pub const DEFAULT_REQUEST_GAP: Duration = Duration::from_secs(1);

/// A fetcher that waits for a permit before each request.
///
/// The first request goes out immediately; each later one waits until
/// `gap` has passed since the previous permit. A zero gap disables pacing.
pub struct RateLimitedFetcher<F: PageFetcher> {
    inner: F,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<F: PageFetcher> RateLimitedFetcher<F> {
    pub fn new(fetcher: F, gap: Duration) -> Self {
        let limiter = Quota::with_period(gap).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self {
            inner: fetcher,
            limiter,
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    async fn wait_for_permit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        self.wait_for_permit().await;
        self.inner.fetch(url).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for pacing any fetcher.
pub trait FetcherExt: PageFetcher + Sized {
    /// Wrap this fetcher so requests are at least `gap` apart.
    fn paced(self, gap: Duration) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, gap)
    }
}

impl<F: PageFetcher + Sized> FetcherExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Instant;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com/{}", path)).unwrap()
    }

    #[tokio::test]
    async fn test_requests_are_spaced_by_gap() {
        let mock = MockFetcher::new().with_default_body("<html></html>");
        let fetcher = mock.clone().paced(Duration::from_millis(150));

        let start = Instant::now();
        for path in ["1", "2", "3"] {
            fetcher.fetch(&url(path)).await.unwrap();
        }
        let elapsed = start.elapsed();

        // First is immediate, second and third each wait one gap
        assert!(elapsed >= Duration::from_millis(290), "pacing not applied: {:?}", elapsed);

        let times = mock.call_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(140), "gap too small: {:?}", gap);
        }
    }

    #[tokio::test]
    async fn test_zero_gap_does_not_wait() {
        let mock = MockFetcher::new().with_default_body("ok");
        let fetcher = mock.clone().paced(Duration::ZERO);

        let start = Instant::now();
        for path in ["1", "2", "3", "4"] {
            fetcher.fetch(&url(path)).await.unwrap();
        }

        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(mock.calls().len(), 4);
    }
}

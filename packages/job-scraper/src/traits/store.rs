//! Posting store trait and bucket push.

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{PersistenceError, StoreResult};
use crate::types::{bucket::Buckets, posting::JobPosting};

/// Destination for date buckets.
///
/// `upsert_bucket` merges postings into the bucket keyed by `key`,
/// replacing any stored posting with the same id. Repeating an upsert with
/// the same postings leaves the store unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Upsert the postings of one bucket.
    async fn upsert_bucket(&self, key: &str, postings: &[JobPosting]) -> StoreResult<()>;
}

/// Per-bucket outcome of [`push_buckets`].
#[derive(Debug, Default)]
pub struct PushReport {
    /// Keys of buckets that were stored
    pub persisted: Vec<String>,

    /// Keys of buckets that failed, with the error
    pub failed: Vec<(String, PersistenceError)>,
}

impl PushReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_keys(&self) -> Vec<String> {
        self.failed.iter().map(|(key, _)| key.clone()).collect()
    }
}

/// Upsert every bucket, in key order.
///
/// A failing bucket is logged and recorded; the remaining buckets are still
/// pushed.
pub async fn push_buckets<S: JobStore + ?Sized>(store: &S, buckets: &Buckets) -> PushReport {
    let mut report = PushReport::default();

    for (key, bucket) in buckets {
        match store.upsert_bucket(key, bucket.postings()).await {
            Ok(()) => {
                info!(bucket = %key, postings = bucket.len(), "Bucket persisted");
                report.persisted.push(key.clone());
            }
            Err(e) => {
                error!(bucket = %key, error = %e, "Failed to persist bucket");
                report.failed.push((key.clone(), e));
            }
        }
    }

    info!(
        persisted = report.persisted.len(),
        failed = report.failed.len(),
        "Push complete"
    );

    report
}

//! One full run: aggregate, then persist.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::pipeline::aggregate::{Aggregator, SearchRequest};
use crate::traits::store::{push_buckets, JobStore};

/// What a run achieved.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub postings_found: usize,
    pub unique_postings: usize,
    pub buckets_persisted: usize,
    pub buckets_failed: Vec<String>,
    pub cancelled: bool,
}

impl RunSummary {
    /// Completed, but at least one bucket was not stored.
    pub fn is_partial_failure(&self) -> bool {
        !self.buckets_failed.is_empty()
    }
}

/// Aggregate and push the buckets to `store`.
///
/// Only an invalid search request is an error. Store failures show up in
/// [`RunSummary::buckets_failed`].
pub async fn run_once<S: JobStore + ?Sized>(
    aggregator: &mut Aggregator,
    store: &S,
    request: &SearchRequest,
    cancel: &CancellationToken,
) -> Result<RunSummary, ConfigError> {
    let report = aggregator.run(request, cancel).await?;
    let push = push_buckets(store, &report.buckets).await;

    let summary = RunSummary {
        run_id: report.run_id,
        postings_found: report.postings_found,
        unique_postings: report.unique_postings(),
        buckets_persisted: push.persisted.len(),
        buckets_failed: push.failed_keys(),
        cancelled: report.cancelled,
    };

    if summary.is_partial_failure() {
        warn!(
            run_id = %summary.run_id,
            found = summary.postings_found,
            persisted = summary.buckets_persisted,
            failed = ?summary.buckets_failed,
            "Run completed with partial persistence failure"
        );
    } else {
        info!(
            run_id = %summary.run_id,
            found = summary.postings_found,
            unique = summary.unique_postings,
            persisted = summary.buckets_persisted,
            cancelled = summary.cancelled,
            "Run completed"
        );
    }

    Ok(summary)
}

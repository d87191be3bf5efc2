//! Aggregation: search terms through every source into date buckets.

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::pipeline::{normalize::CardNormalizer, terms::SearchTermBuilder};
use crate::traits::source::SourceAdapter;
use crate::types::{
    bucket::{bucket_by_date, Buckets},
    posting::JobPosting,
    search::SearchPhrase,
};

/// What one run searches for.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub titles: Vec<String>,
    pub levels: Vec<String>,
    pub vocabulary: Vec<String>,
}

impl SearchRequest {
    pub fn new(titles: Vec<String>, levels: Vec<String>) -> Self {
        Self {
            titles,
            levels,
            vocabulary: Vec::new(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vec<String>) -> Self {
        self.vocabulary = vocabulary;
        self
    }
}

/// Outcome of one source within a run.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub name: String,

    /// Postings kept from this source, before deduplication
    pub postings: usize,

    /// Terms whose fetch failed
    pub failed_terms: Vec<SearchPhrase>,
}

/// Result of one aggregation run.
#[derive(Debug)]
pub struct AggregationReport {
    pub run_id: Uuid,
    pub buckets: Buckets,

    /// Postings accumulated across all sources, before deduplication
    pub postings_found: usize,

    pub per_source: Vec<SourceSummary>,
    pub cancelled: bool,
}

impl AggregationReport {
    /// Postings left after deduplication.
    pub fn unique_postings(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }
}

struct SourceOutcome {
    postings: Vec<JobPosting>,
    summary: SourceSummary,
    cancelled: bool,
}

enum Step<T> {
    Cancelled,
    Next(Option<T>),
}

/// Runs search terms through every registered source and buckets the
/// normalized postings by date.
///
/// Sources run concurrently, each working through its terms in order.
/// Results are merged in registration order, so a fixed set of source
/// responses always produces the same buckets.
pub struct Aggregator {
    sources: Vec<Box<dyn SourceAdapter>>,
    today: Option<NaiveDate>,
    discard_on_cancel: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            today: None,
            discard_on_cancel: false,
        }
    }

    pub fn with_sources(sources: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            sources,
            ..Self::new()
        }
    }

    /// Register a source (builder pattern).
    pub fn with_source(mut self, source: impl SourceAdapter + 'static) -> Self {
        self.add_source(source);
        self
    }

    pub fn add_source(&mut self, source: impl SourceAdapter + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Fix the date relative dates resolve against. Defaults to the local
    /// date at run start.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Drop partial results when a run is cancelled.
    pub fn with_discard_on_cancel(mut self, discard: bool) -> Self {
        self.discard_on_cancel = discard;
        self
    }

    pub fn sources(&self) -> &[Box<dyn SourceAdapter>] {
        &self.sources
    }

    /// Run one aggregation.
    ///
    /// Fails only on an invalid search request, before any fetch. Fetch
    /// failures count as zero results for their (source, term) pair.
    pub async fn run(
        &mut self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregationReport, ConfigError> {
        let phrases = SearchTermBuilder::build(&request.titles, &request.levels)?;

        let run_id = Uuid::now_v7();
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let normalizer = CardNormalizer::new(request.vocabulary.iter().cloned(), today);
        let discard_on_cancel = self.discard_on_cancel;

        for source in &mut self.sources {
            source.set_search_terms(&phrases);
        }

        let sources = &self.sources;
        async move {
            info!(
                sources = sources.len(),
                terms = phrases.len(),
                today = %today,
                "Starting aggregation"
            );

            let outcomes = join_all(
                sources
                    .iter()
                    .map(|source| drive_source(source.as_ref(), &normalizer, cancel)),
            )
            .await;

            let cancelled = outcomes.iter().any(|o| o.cancelled);
            let mut postings = Vec::new();
            let mut per_source = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                postings.extend(outcome.postings);
                per_source.push(outcome.summary);
            }

            if cancelled && discard_on_cancel {
                warn!(discarded = postings.len(), "Run cancelled, discarding partial results");
                postings.clear();
            }

            let postings_found = postings.len();
            let buckets = bucket_by_date(postings);
            let report = AggregationReport {
                run_id,
                buckets,
                postings_found,
                per_source,
                cancelled,
            };

            info!(
                found = report.postings_found,
                unique = report.unique_postings(),
                buckets = report.buckets.len(),
                cancelled,
                "Aggregation complete"
            );

            Ok(report)
        }
        .instrument(info_span!("aggregation_run", run_id = %run_id))
        .await
    }
}

/// Work through every term registered on one source, in order.
async fn drive_source(
    source: &dyn SourceAdapter,
    normalizer: &CardNormalizer,
    cancel: &CancellationToken,
) -> SourceOutcome {
    let name = source.name().to_string();
    let mut postings = Vec::new();
    let mut failed_terms = Vec::new();
    let mut cancelled = false;

    async {
        'terms: for term in source.search_terms() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let mut found = Vec::new();
            let mut stream = source.search(term);
            loop {
                let step = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Step::Cancelled,
                    item = stream.next() => Step::Next(item),
                };

                match step {
                    Step::Cancelled => {
                        // Keep what this term produced so far
                        postings.append(&mut found);
                        cancelled = true;
                        break 'terms;
                    }
                    Step::Next(None) => break,
                    Step::Next(Some(Ok(fragment))) => {
                        let fields = source.parse_card(&fragment);
                        match normalizer.normalize(fields, &name, source.identity_rule()) {
                            Some(posting) => found.push(posting),
                            None => debug!(term = %term, "Card skipped"),
                        }
                    }
                    Step::Next(Some(Err(e))) => {
                        warn!(term = %term, error = %e, "Fetch failed, no results for term");
                        found.clear();
                        failed_terms.push(term.clone());
                        break;
                    }
                }
            }

            info!(term = %term, found = found.len(), "Term complete");
            postings.append(&mut found);
        }

        info!(
            postings = postings.len(),
            failed_terms = failed_terms.len(),
            cancelled,
            "Source complete"
        );
    }
    .instrument(info_span!("source", name = %name))
    .await;

    SourceOutcome {
        summary: SourceSummary {
            name,
            postings: postings.len(),
            failed_terms,
        },
        postings,
        cancelled,
    }
}

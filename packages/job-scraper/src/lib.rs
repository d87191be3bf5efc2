//! Job Listing Aggregator
//!
//! Queries public job boards for postings matching a set of job titles and
//! levels, normalizes each board's cards into a common [`JobPosting`],
//! deduplicates and buckets them by posting date, and upserts the buckets
//! into a document store.
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_scraper::{run_once, Aggregator, MemoryStore, ScraperConfig};
//! use job_scraper::boards::configured_sources;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ScraperConfig::load("config.json")?;
//! let mut aggregator = Aggregator::with_sources(configured_sources(&config)?);
//! let store = MemoryStore::new();
//!
//! let summary = run_once(&mut aggregator, &store, &config.search_request(), &CancellationToken::new()).await?;
//! println!("{} postings in {} buckets", summary.unique_postings, summary.buckets_persisted);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability traits (PageFetcher, SourceAdapter, JobStore)
//! - [`types`] - Postings, fragments, search phrases and date buckets
//! - [`pipeline`] - Term expansion, normalization, aggregation, runs
//! - [`boards`] - LinkedIn and Indeed rule sets
//! - [`fetchers`] - HTTP and rate-limited fetchers
//! - [`stores`] - Store implementations (MemoryStore, FirebaseStore, etc.)
//! - [`testing`] - Mock implementations for testing

pub mod boards;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::ScraperConfig;
pub use error::{ConfigError, FetchError, PersistenceError, ScraperError};
pub use traits::{
    fetcher::PageFetcher,
    source::{FragmentStream, SourceAdapter},
    store::{push_buckets, JobStore, PushReport},
};
pub use types::{
    bucket::{bucket_by_date, dedupe_by_id, Buckets, DateBucket},
    fragment::{CardFields, RawFragment},
    posting::{IdentityRule, JobPosting, NewPosting},
    search::SearchPhrase,
};

pub use pipeline::{
    run_once, AggregationReport, Aggregator, CardNormalizer, RunSummary, SearchRequest,
    SearchTermBuilder, SourceSummary,
};

pub use boards::{configured_sources, BoardAdapter, Indeed, JobBoard, LinkedIn};
pub use fetchers::{FetcherExt, HttpFetcher, RateLimitedFetcher};

pub use stores::{FirebaseStore, MemoryStore};
#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

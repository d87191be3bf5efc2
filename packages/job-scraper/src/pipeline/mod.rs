//! The aggregation pipeline.
//!
//! ```text
//! titles × levels ─► SearchTermBuilder ─► SourceAdapter::search ─► CardNormalizer
//!                                                                      │
//!                               JobStore ◄─ push_buckets ◄─ Aggregator ◄┘
//! ```

pub mod aggregate;
pub mod normalize;
pub mod run;
pub mod terms;

pub use aggregate::{AggregationReport, Aggregator, SearchRequest, SourceSummary};
pub use normalize::CardNormalizer;
pub use run::{run_once, RunSummary};
pub use terms::SearchTermBuilder;

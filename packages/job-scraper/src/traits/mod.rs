//! Capability traits for the aggregation pipeline.
//!
//! Fetching pages, producing listing fragments and persisting buckets are
//! each behind a trait so the pipeline can be driven by mocks in tests.

pub mod fetcher;
pub mod source;
pub mod store;

//! In-memory job store for dry runs and tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::store::JobStore;
use crate::types::posting::JobPosting;

type Bucket = IndexMap<String, JobPosting>;

/// Buckets held in memory. Data is lost when the store is dropped.
pub struct MemoryStore {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Stored bucket keys, in date order.
    pub fn bucket_keys(&self) -> Vec<String> {
        self.read(|buckets| buckets.keys().cloned().collect())
    }

    /// Postings of one bucket, in insertion order.
    pub fn bucket(&self, key: &str) -> Vec<JobPosting> {
        self.read(|buckets| {
            buckets
                .get(key)
                .map(|bucket| bucket.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Number of postings across all buckets.
    pub fn posting_count(&self) -> usize {
        self.read(|buckets| buckets.values().map(IndexMap::len).sum())
    }

    pub fn clear(&self) {
        self.buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<String, Bucket>) -> T) -> T {
        let buckets = self
            .buckets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&buckets)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn upsert_bucket(&self, key: &str, postings: &[JobPosting]) -> StoreResult<()> {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let bucket = buckets.entry(key.to_string()).or_default();
        for posting in postings {
            bucket.insert(posting.id().to_string(), posting.clone());
        }
        Ok(())
    }
}

//! Date buckets: postings grouped by posting date, unique by id.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

use super::posting::{JobPosting, BUCKET_KEY_FORMAT};

/// Bucket key (`YYYY-MM-DD`) to bucket. Ordered, so iteration is
/// chronological.
pub type Buckets = BTreeMap<String, DateBucket>;

/// The set of postings sharing one `date_posted`, unique by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateBucket {
    date: NaiveDate,
    postings: Vec<JobPosting>,
}

impl DateBucket {
    /// Build a bucket, collapsing postings that share an id.
    ///
    /// Postings from other dates are ignored.
    pub fn from_postings(date: NaiveDate, postings: Vec<JobPosting>) -> Self {
        let postings = postings
            .into_iter()
            .filter(|p| p.date_posted() == date)
            .collect();

        Self {
            date,
            postings: dedupe_by_id(postings),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// ISO key of this bucket.
    pub fn key(&self) -> String {
        self.date.format(BUCKET_KEY_FORMAT).to_string()
    }

    pub fn postings(&self) -> &[JobPosting] {
        &self.postings
    }

    pub fn into_postings(self) -> Vec<JobPosting> {
        self.postings
    }

    pub fn get(&self, id: &str) -> Option<&JobPosting> {
        self.postings.iter().find(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Collapse postings sharing an `id`.
///
/// The last posting seen for an id wins, kept at the position where the id
/// first appeared, so the output is deterministic for a fixed input order.
/// Applying this to its own output changes nothing.
pub fn dedupe_by_id(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut by_id: IndexMap<String, JobPosting> = IndexMap::with_capacity(postings.len());
    for posting in postings {
        by_id.insert(posting.id().to_string(), posting);
    }
    by_id.into_values().collect()
}

/// Group postings by posting date, then deduplicate within each bucket.
pub fn bucket_by_date(postings: Vec<JobPosting>) -> Buckets {
    let mut grouped: BTreeMap<NaiveDate, Vec<JobPosting>> = BTreeMap::new();
    for posting in postings {
        grouped
            .entry(posting.date_posted())
            .or_default()
            .push(posting);
    }

    grouped
        .into_iter()
        .map(|(date, postings)| {
            let bucket = DateBucket::from_postings(date, postings);
            (bucket.key(), bucket)
        })
        .collect()
}

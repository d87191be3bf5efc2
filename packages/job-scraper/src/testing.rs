//! Testing utilities including mock implementations.
//!
//! Mocks share their state between clones, so a test can hand a clone to
//! the pipeline and inspect recorded calls on the original.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{FetchError, FetchResult, PersistenceError, StoreResult};
use crate::stores::MemoryStore;
use crate::traits::{
    fetcher::PageFetcher,
    source::{FragmentStream, SourceAdapter},
    store::JobStore,
};
use crate::types::{
    fragment::{CardFields, RawFragment},
    posting::{JobPosting, NewPosting},
    search::SearchPhrase,
};

/// A complete posting for tests.
pub fn posting(id: &str, company: &str, date: NaiveDate) -> JobPosting {
    JobPosting::from_parts(NewPosting {
        title: "Software Engineer".to_string(),
        company: company.to_string(),
        location: "Minneapolis, MN".to_string(),
        link: format!("https://example.com/jobs/{}", id),
        date_posted: Some(date),
        id: id.to_string(),
        source: "Mock".to_string(),
        keywords: Vec::new(),
    })
    .expect("test posting is complete")
}

/// A mock page fetcher.
///
/// Returns canned bodies without making network requests.
#[derive(Default, Clone)]
pub struct MockFetcher {
    /// Bodies by exact URL
    bodies: Arc<RwLock<HashMap<String, String>>>,

    /// Body for any other URL
    default_body: Arc<RwLock<Option<String>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<HashSet<String>>>,

    fail_all: Arc<RwLock<bool>>,

    /// Call tracking
    calls: Arc<RwLock<Vec<(String, Instant)>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.write().unwrap().insert(url.into(), body.into());
        self
    }

    /// Serve `body` for every URL without its own body.
    pub fn with_default_body(self, body: impl Into<String>) -> Self {
        *self.default_body.write().unwrap() = Some(body.into());
        self
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().insert(url.into());
        self
    }

    /// Fail every request.
    pub fn failing_default(self) -> Self {
        *self.fail_all.write().unwrap() = true;
        self
    }

    /// URLs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// When each request was made.
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.read().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        let url = url.to_string();
        self.calls.write().unwrap().push((url.clone(), Instant::now()));

        if *self.fail_all.read().unwrap() || self.fail_urls.read().unwrap().contains(&url) {
            return Err(FetchError::Status { url, status: 503 });
        }

        if let Some(body) = self.bodies.read().unwrap().get(&url) {
            return Ok(body.clone());
        }

        self.default_body
            .read()
            .unwrap()
            .clone()
            .ok_or(FetchError::Status { url, status: 404 })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock source adapter.
///
/// Serves canned cards per search phrase. Fragment bodies are the cards as
/// JSON, so `parse_card` returns exactly what was configured.
#[derive(Clone)]
pub struct MockSource {
    name: String,
    base_url: Url,
    terms: Vec<SearchPhrase>,

    /// Cards by phrase
    cards: Arc<RwLock<HashMap<String, Vec<CardFields>>>>,

    /// Phrases whose search fails
    fail_terms: Arc<RwLock<HashSet<String>>>,

    /// Pause before each card
    delay: Option<Duration>,

    /// Phrases searched, in order
    searched: Arc<RwLock<Vec<String>>>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: Url::parse("https://jobs.example.com/search").expect("valid mock URL"),
            terms: Vec::new(),
            cards: Arc::default(),
            fail_terms: Arc::default(),
            delay: None,
            searched: Arc::default(),
        }
    }

    /// Return `cards` when `term` is searched.
    pub fn with_cards(self, term: &str, cards: Vec<CardFields>) -> Self {
        self.cards
            .write()
            .unwrap()
            .entry(term.to_string())
            .or_default()
            .extend(cards);
        self
    }

    /// Fail the search for `term` with a fetch error.
    pub fn fail_term(self, term: &str) -> Self {
        self.fail_terms.write().unwrap().insert(term.to_string());
        self
    }

    /// Sleep before yielding each card.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Phrases searched so far.
    pub fn searched(&self) -> Vec<String> {
        self.searched.read().unwrap().clone()
    }
}

impl SourceAdapter for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_search_terms(&mut self, terms: &[SearchPhrase]) {
        for term in terms {
            if !self.terms.contains(term) {
                self.terms.push(term.clone());
            }
        }
    }

    fn search_terms(&self) -> &[SearchPhrase] {
        &self.terms
    }

    fn search<'a>(&'a self, term: &'a SearchPhrase) -> FragmentStream<'a> {
        self.searched.write().unwrap().push(term.to_string());

        if self.fail_terms.read().unwrap().contains(term.as_str()) {
            let error = FetchError::Status {
                url: self.base_url.to_string(),
                status: 503,
            };
            return futures::stream::iter(vec![Err(error)]).boxed();
        }

        let cards = self
            .cards
            .read()
            .unwrap()
            .get(term.as_str())
            .cloned()
            .unwrap_or_default();
        let delay = self.delay;

        async_stream::stream! {
            for card in cards {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let body = serde_json::to_string(&card).unwrap_or_default();
                yield Ok(RawFragment::new(self.name.clone(), body, self.base_url.clone()));
            }
        }
        .boxed()
    }

    fn parse_card(&self, fragment: &RawFragment) -> CardFields {
        serde_json::from_str(&fragment.body).unwrap_or_default()
    }
}

/// A store that fails selected buckets and keeps the rest in memory.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_keys: HashSet<String>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject upserts to bucket `key`.
    pub fn fail_bucket(mut self, key: impl Into<String>) -> Self {
        self.fail_keys.insert(key.into());
        self
    }

    /// The postings that were stored.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl JobStore for FailingStore {
    async fn upsert_bucket(&self, key: &str, postings: &[JobPosting]) -> StoreResult<()> {
        if self.fail_keys.contains(key) {
            return Err(PersistenceError::Rejected {
                bucket: key.to_string(),
                status: 500,
            });
        }
        self.inner.upsert_bucket(key, postings).await
    }
}

//! HTML job boards.
//!
//! A [`JobBoard`] is the per-site rule set: how to build the search URL,
//! which elements are listing cards, and how to read fields out of a card.
//! [`BoardAdapter`] pairs a board with a [`PageFetcher`] and implements
//! [`SourceAdapter`] on top.

pub mod indeed;
pub mod linkedin;

pub use indeed::Indeed;
pub use linkedin::LinkedIn;

use futures::StreamExt;
use scraper::{Html, Selector};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{ConfigError, FetchError, ScraperError};
use crate::fetchers::{FetcherExt, HttpFetcher, RateLimitedFetcher};
use crate::traits::{
    fetcher::PageFetcher,
    source::{FragmentStream, SourceAdapter},
};
use crate::types::{
    fragment::{CardFields, RawFragment},
    posting::IdentityRule,
    search::SearchPhrase,
};

/// Site-specific search and extraction rules.
pub trait JobBoard: Send + Sync {
    /// Source name stored on postings.
    fn name(&self) -> &str;

    /// Search URL for one phrase, including the fixed time filter.
    fn search_url(&self, term: &SearchPhrase) -> Result<Url, FetchError>;

    /// Outer HTML of each listing card on a results page.
    fn select_cards(&self, page: &Html) -> Vec<String>;

    /// Raw fields of one card. `base_url` resolves relative links.
    fn parse_card(&self, card: &Html, base_url: &Url) -> CardFields;

    /// How postings from this board derive their id.
    fn identity_rule(&self) -> &IdentityRule;
}

/// Trimmed, whitespace-collapsed text of the first match of any selector.
pub fn select_text(root: &Html, selectors: &[&Selector]) -> String {
    for selector in selectors {
        if let Some(element) = root.select(selector).next() {
            let text = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// Trimmed attribute of the first match, or empty.
pub fn select_attr(root: &Html, selector: &Selector, attr: &str) -> String {
    root.select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Resolve `href` against the page URL.
pub fn resolve_link(base_url: &Url, href: &str) -> Option<Url> {
    if href.is_empty() {
        return None;
    }
    base_url.join(href).ok()
}

fn extract_cards<B: JobBoard + ?Sized>(board: &B, body: &str) -> Vec<String> {
    let page = Html::parse_document(body);
    board.select_cards(&page)
}

/// A [`SourceAdapter`] made of a [`JobBoard`] and a [`PageFetcher`].
///
/// Searches on one adapter are serialized by a session lock held for the
/// lifetime of each search stream. Pacing comes from the fetcher; wrap it
/// with [`FetcherExt::paced`].
pub struct BoardAdapter<B, F> {
    board: B,
    fetcher: F,
    terms: Vec<SearchPhrase>,
    session: Mutex<()>,
}

impl<B: JobBoard, F: PageFetcher> BoardAdapter<B, F> {
    pub fn new(board: B, fetcher: F) -> Self {
        Self {
            board,
            fetcher,
            terms: Vec::new(),
            session: Mutex::new(()),
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }
}

impl<B: JobBoard, F: PageFetcher> SourceAdapter for BoardAdapter<B, F> {
    fn name(&self) -> &str {
        self.board.name()
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
        async_stream::stream! {
            let _session = self.session.lock().await;

            let url = match self.board.search_url(term) {
                Ok(url) => url,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            debug!(source = %self.name(), fetcher = %self.fetcher.name(), term = %term, url = %url, "Searching");
            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let cards = extract_cards(&self.board, &body);
            if cards.is_empty() {
                info!(source = %self.name(), term = %term, "No new jobs found");
            }

            for card in cards {
                yield Ok(RawFragment::new(self.board.name(), card, url.clone()));
            }
        }
        .boxed()
    }

    fn parse_card(&self, fragment: &RawFragment) -> CardFields {
        let card = Html::parse_fragment(&fragment.body);
        self.board.parse_card(&card, &fragment.base_url)
    }

    fn identity_rule(&self) -> &IdentityRule {
        self.board.identity_rule()
    }
}

/// Paced HTTP fetcher for one source.
fn source_fetcher(config: &ScraperConfig) -> Result<RateLimitedFetcher<HttpFetcher>, FetchError> {
    Ok(HttpFetcher::new(config.timeout())?.paced(config.request_gap()))
}

/// Build the enabled sources, in registration order (LinkedIn, Indeed).
///
/// Each source gets its own fetcher, so pacing is per source.
pub fn configured_sources(config: &ScraperConfig) -> Result<Vec<Box<dyn SourceAdapter>>, ScraperError> {
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();
    let location = &config.search.location;

    let linkedin = &config.sources.linkedin;
    if linkedin.enabled {
        let mut board = LinkedIn::new(location);
        if let Some(base_url) = &linkedin.base_url {
            board = board.with_base_url(base_url)?;
        }
        sources.push(Box::new(BoardAdapter::new(board, source_fetcher(config)?)));
    }

    let indeed = &config.sources.indeed;
    if indeed.enabled {
        let mut board = Indeed::new(location);
        if let Some(base_url) = &indeed.base_url {
            board = board.with_base_url(base_url)?;
        }
        sources.push(Box::new(BoardAdapter::new(board, source_fetcher(config)?)));
    }

    if sources.is_empty() {
        return Err(ConfigError::NoSources.into());
    }

    Ok(sources)
}

/// Parse a configured board base URL.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use futures::TryStreamExt;

    const RESULTS: &str = r#"
        <ul class="jobs-search__results-list">
          <li>
            <h3 class="base-search-card__title">Rust Engineer</h3>
            <h4 class="base-search-card__subtitle">Acme</h4>
            <span class="job-search-card__location">Minneapolis, MN</span>
            <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/rust-engineer-at-acme-101?trk=x">view</a>
            <time datetime="2024-06-09">1 day ago</time>
          </li>
        </ul>
    "#;

    fn adapter(fetcher: MockFetcher) -> BoardAdapter<LinkedIn, MockFetcher> {
        BoardAdapter::new(LinkedIn::new("United States"), fetcher)
    }

    #[test]
    fn test_set_search_terms_is_additive_without_repeats() {
        let mut adapter = adapter(MockFetcher::new());

        adapter.set_search_terms(&["Engineer Intern".into(), "Analyst Intern".into()]);
        adapter.set_search_terms(&["Engineer Intern".into(), "Engineer Senior".into()]);

        let terms: Vec<_> = adapter.search_terms().iter().map(|t| t.as_str()).collect();
        assert_eq!(terms, vec!["Engineer Intern", "Analyst Intern", "Engineer Senior"]);
    }

    #[tokio::test]
    async fn test_search_yields_one_fragment_per_card() {
        let adapter = adapter(MockFetcher::new().with_default_body(RESULTS));
        let term = SearchPhrase::from("Rust Engineer Intern");

        let fragments: Vec<_> = adapter.search(&term).try_collect().await.unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].source, "LinkedIn");
        let fields = adapter.parse_card(&fragments[0]);
        assert_eq!(fields.title, "Rust Engineer");
        assert_eq!(fields.link, "https://www.linkedin.com/jobs/view/rust-engineer-at-acme-101");
    }

    #[tokio::test]
    async fn test_page_without_cards_is_empty_stream() {
        let adapter = adapter(MockFetcher::new().with_default_body("<html><body>nothing</body></html>"));
        let term = SearchPhrase::from("Rust Engineer Intern");

        let fragments: Vec<_> = adapter.search(&term).collect().await;
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_single_error() {
        let fetcher = MockFetcher::new().failing_default();
        let adapter = adapter(fetcher.clone());
        let term = SearchPhrase::from("Rust Engineer Intern");

        let items: Vec<_> = adapter.search(&term).collect().await;

        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_searches_are_serialized() {
        let adapter = adapter(MockFetcher::new().with_default_body(RESULTS));
        let first = SearchPhrase::from("a");
        let second = SearchPhrase::from("b");

        let mut one = adapter.search(&first);
        // Hold the first session open
        let _ = one.next().await;

        let mut two = adapter.search(&second);
        let blocked = tokio::time::timeout(std::time::Duration::from_millis(50), two.next()).await;
        assert!(blocked.is_err(), "second search ran while first was open");

        drop(one);
        let item = two.next().await;
        assert!(matches!(item, Some(Ok(_))));
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://www.indeed.com/jobs?q=rust").unwrap();
        assert_eq!(
            resolve_link(&base, "/viewjob?jk=abc").unwrap().as_str(),
            "https://www.indeed.com/viewjob?jk=abc"
        );
        assert!(resolve_link(&base, "").is_none());
    }
}

//! LinkedIn public job search.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::{parse_base_url, resolve_link, select_attr, select_text, JobBoard};
use crate::error::{ConfigError, FetchError};
use crate::types::{fragment::CardFields, posting::IdentityRule, search::SearchPhrase};

const DEFAULT_BASE_URL: &str = "https://www.linkedin.com/jobs/search/";

/// Postings from the last 24 hours.
const TIME_FILTER: &str = "r86400";

struct Selectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
    date: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("valid LinkedIn selector");
        Selectors {
            card: parse("ul.jobs-search__results-list > li"),
            title: parse("h3.base-search-card__title"),
            company: parse("h4.base-search-card__subtitle"),
            location: parse("span.job-search-card__location"),
            link: parse("a.base-card__full-link"),
            date: parse("time"),
        }
    })
}

fn job_view_pattern() -> Regex {
    Regex::new(r"/jobs/view/(?:[^/?#]*-)?(\d+)/?$").expect("valid job view pattern")
}

/// LinkedIn guest job search results.
///
/// Job view links embed a numeric posting id, which is used as the posting
/// identity.
pub struct LinkedIn {
    base_url: Url,
    location: String,
    identity: IdentityRule,
}

impl LinkedIn {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid LinkedIn base URL"),
            location: location.into(),
            identity: IdentityRule::EmbeddedNumeric(job_view_pattern()),
        }
    }

    /// Search against a different host, e.g. a local fixture server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url("sources.linkedin.base_url", base_url)?;
        Ok(self)
    }
}

/// Drop query and fragment: tracking parameters vary between result pages.
fn canonical_link(link: &Url) -> String {
    let mut link = link.clone();
    link.set_query(None);
    link.set_fragment(None);
    link.to_string()
}

impl JobBoard for LinkedIn {
    fn name(&self) -> &str {
        "LinkedIn"
    }

    fn search_url(&self, term: &SearchPhrase) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("keywords", term.as_str())
            .append_pair("location", &self.location)
            .append_pair("f_TPR", TIME_FILTER);
        Ok(url)
    }

    fn select_cards(&self, page: &Html) -> Vec<String> {
        page.select(&selectors().card).map(|card| card.html()).collect()
    }

    fn parse_card(&self, card: &Html, base_url: &Url) -> CardFields {
        let s = selectors();

        let href = select_attr(card, &s.link, "href");
        let link = resolve_link(base_url, &href)
            .map(|url| canonical_link(&url))
            .unwrap_or_default();

        let mut date_posted = select_attr(card, &s.date, "datetime");
        if date_posted.is_empty() {
            date_posted = select_text(card, &[&s.date]);
        }

        CardFields {
            title: select_text(card, &[&s.title]),
            company: select_text(card, &[&s.company]),
            location: select_text(card, &[&s.location]),
            link,
            date_posted,
        }
    }

    fn identity_rule(&self) -> &IdentityRule {
        &self.identity
    }
}

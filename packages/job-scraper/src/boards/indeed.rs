//! Indeed job search.

use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::{parse_base_url, resolve_link, select_attr, select_text, JobBoard};
use crate::error::{ConfigError, FetchError};
use crate::types::{fragment::CardFields, posting::IdentityRule, search::SearchPhrase};

const DEFAULT_BASE_URL: &str = "https://www.indeed.com/jobs";

/// Postings from the last day.
const TIME_FILTER: &str = "1";

/// Query parameter carrying the Indeed job key.
const JOB_KEY_PARAM: &str = "jk";

struct Selectors {
    card: Selector,
    title: Selector,
    link: Selector,
    company: Selector,
    company_testid: Selector,
    location: Selector,
    location_testid: Selector,
    date: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("valid Indeed selector");
        Selectors {
            card: parse(".job_seen_beacon"),
            title: parse("h2"),
            link: parse("h2 a"),
            company: parse(".companyName"),
            company_testid: parse(r#"[data-testid="company-name"]"#),
            location: parse(".companyLocation"),
            location_testid: parse(r#"[data-testid="text-location"]"#),
            date: parse(".date"),
        }
    })
}

/// Indeed search results. Posting identity is the content hash of the
/// canonical view link.
pub struct Indeed {
    base_url: Url,
    location: String,
    identity: IdentityRule,
}

impl Indeed {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid Indeed base URL"),
            location: location.into(),
            identity: IdentityRule::ContentHash,
        }
    }

    /// Search against a different host, e.g. a local fixture server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url("sources.indeed.base_url", base_url)?;
        Ok(self)
    }
}

/// Rewrite click-tracking links to the job view page and keep only the job
/// key, so the same listing always has the same link.
fn canonical_link(base_url: &Url, href: &str) -> Option<String> {
    let href = href.replace("/rc/clk?", "/viewjob?");
    let mut link = resolve_link(base_url, &href)?;
    link.set_fragment(None);

    let job_key = link
        .query_pairs()
        .find(|(key, _)| key == JOB_KEY_PARAM)
        .map(|(_, value)| value.into_owned());

    if let Some(job_key) = job_key {
        link.query_pairs_mut()
            .clear()
            .append_pair(JOB_KEY_PARAM, &job_key);
    }

    Some(link.to_string())
}

impl JobBoard for Indeed {
    fn name(&self) -> &str {
        "Indeed"
    }

    fn search_url(&self, term: &SearchPhrase) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("q", term.as_str())
            .append_pair("l", &self.location)
            .append_pair("fromage", TIME_FILTER);
        Ok(url)
    }

    fn select_cards(&self, page: &Html) -> Vec<String> {
        page.select(&selectors().card).map(|card| card.html()).collect()
    }

    fn parse_card(&self, card: &Html, base_url: &Url) -> CardFields {
        let s = selectors();

        let href = select_attr(card, &s.link, "href");
        let link = canonical_link(base_url, &href).unwrap_or_default();

        CardFields {
            title: select_text(card, &[&s.title]),
            company: select_text(card, &[&s.company, &s.company_testid]),
            location: select_text(card, &[&s.location, &s.location_testid]),
            link,
            date_posted: select_text(card, &[&s.date]),
        }
    }

    fn identity_rule(&self) -> &IdentityRule {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <div class="job_seen_beacon">
          <table><tbody><tr><td class="resultContent">
            <h2 class="jobTitle">
              <a href="/rc/clk?jk=5f2a9c1e7b3d4a60&amp;fccid=abc&amp;vjs=3" data-jk="5f2a9c1e7b3d4a60">
                <span title="Data Analyst Intern">Data Analyst Intern</span>
              </a>
            </h2>
            <div class="company_location">
              <span class="companyName">Beta Analytics</span>
              <div class="companyLocation">Saint Paul, MN 55101</div>
            </div>
          </td></tr></tbody></table>
          <span class="date"><span class="visually-hidden">Posted</span>Posted 3 days ago</span>
        </div>
    "#;

    const TESTID_CARD: &str = r#"
        <div class="job_seen_beacon">
          <h2 class="jobTitle"><a href="/viewjob?jk=0001&amp;from=serp">Backend Engineer</a></h2>
          <span data-testid="company-name">Gamma</span>
          <div data-testid="text-location">Remote</div>
          <span class="date">Just posted</span>
        </div>
    "#;

    fn base() -> Url {
        Url::parse("https://www.indeed.com/jobs?q=analyst&l=United+States&fromage=1").unwrap()
    }

    #[test]
    fn test_search_url_has_time_filter_and_location() {
        let board = Indeed::new("United States");
        let url = board.search_url(&"Data Analyst Intern".into()).unwrap();

        assert_eq!(
            url.as_str(),
            "https://www.indeed.com/jobs?q=Data+Analyst+Intern&l=United+States&fromage=1"
        );
    }

    #[test]
    fn test_parse_card_fields() {
        let board = Indeed::new("United States");
        let fields = board.parse_card(&Html::parse_fragment(CARD), &base());

        assert_eq!(fields.title, "Data Analyst Intern");
        assert_eq!(fields.company, "Beta Analytics");
        // Postal code is stripped later by the normalizer
        assert_eq!(fields.location, "Saint Paul, MN 55101");
        assert_eq!(fields.link, "https://www.indeed.com/viewjob?jk=5f2a9c1e7b3d4a60");
        assert!(fields.date_posted.contains("3 days ago"));
    }

    #[test]
    fn test_data_testid_fallbacks() {
        let board = Indeed::new("United States");
        let fields = board.parse_card(&Html::parse_fragment(TESTID_CARD), &base());

        assert_eq!(fields.company, "Gamma");
        assert_eq!(fields.location, "Remote");
        assert_eq!(fields.link, "https://www.indeed.com/viewjob?jk=0001");
        assert_eq!(fields.date_posted, "Just posted");
    }

    #[test]
    fn test_canonical_link_without_job_key_keeps_query() {
        let link = canonical_link(&base(), "/pagead/clk?mo=r&ad=xyz#frag").unwrap();
        assert_eq!(link, "https://www.indeed.com/pagead/clk?mo=r&ad=xyz");
    }

    #[test]
    fn test_select_cards_from_results_page() {
        let page = format!("<html><body><div id=\"mosaic\">{}{}</div></body></html>", CARD, TESTID_CARD);
        let board = Indeed::new("United States");

        assert_eq!(board.select_cards(&Html::parse_document(&page)).len(), 2);
    }
}

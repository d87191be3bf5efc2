//! Card normalization: raw card fields to a canonical [`JobPosting`].

use chrono::{Days, NaiveDate};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

use crate::types::{
    fragment::CardFields,
    posting::{IdentityRule, JobPosting, NewPosting, BUCKET_KEY_FORMAT},
};

fn postal_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{5}").expect("valid postal code pattern"))
}

fn days_ago_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\+?\s*days?\b").expect("valid days-ago pattern"))
}

fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid date pattern"))
}

/// Converts the raw fields of one listing card into a [`JobPosting`].
///
/// Holds the keyword vocabulary and the run's "today", so every card in a
/// run is dated against the same day.
#[derive(Debug, Clone)]
pub struct CardNormalizer {
    vocabulary: Vec<String>,
    today: NaiveDate,
}

impl CardNormalizer {
    /// Create a normalizer. Blank and repeated vocabulary terms are dropped,
    /// keeping the first occurrence.
    pub fn new<I, S>(vocabulary: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms: Vec<String> = Vec::new();
        for term in vocabulary {
            let term = term.into().trim().to_string();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }

        Self {
            vocabulary: terms,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Normalize one card. Returns `None` if any required field is empty
    /// after extraction; skips are logged at debug.
    pub fn normalize(
        &self,
        fields: CardFields,
        source: &str,
        identity: &IdentityRule,
    ) -> Option<JobPosting> {
        let title = fields.title.trim().to_string();
        let company = fields.company.trim().to_string();
        let location = strip_postal_codes(&fields.location);

        let link = match Url::parse(fields.link.trim()) {
            Ok(url) => url.to_string(),
            Err(_) => String::new(),
        };

        let raw_date = fields.date_posted.trim();
        let date_posted = if raw_date.is_empty() {
            None
        } else {
            Some(parse_date_posted(raw_date, self.today))
        };

        let id = if link.is_empty() {
            String::new()
        } else {
            derive_id(identity, &link)
        };

        let keywords = tag_keywords(&title, &self.vocabulary);

        let posting = JobPosting::from_parts(NewPosting {
            title,
            company,
            location,
            link,
            date_posted,
            id,
            source: source.to_string(),
            keywords,
        });

        if posting.is_none() {
            debug!(source = %source, title = %fields.title, link = %fields.link, "Skipping incomplete card");
        }
        posting
    }
}

/// Remove every 5-digit run, collapse whitespace and trim.
pub fn strip_postal_codes(location: &str) -> String {
    postal_code_pattern()
        .replace_all(location, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a listing's posted date against `today`.
///
/// Case-insensitive: "today" or "just" gives today, "yesterday" gives the
/// day before, "N days ago" (or "N+ days ago") gives N days before, and a
/// bare ISO date is taken as is. Anything else is treated as today.
pub fn parse_date_posted(raw: &str, today: NaiveDate) -> NaiveDate {
    let text = raw.to_lowercase();

    if text.contains("today") || text.contains("just") {
        return today;
    }
    if text.contains("yesterday") {
        return today.pred_opt().unwrap_or(today);
    }
    if let Some(caps) = days_ago_pattern().captures(&text) {
        return caps[1]
            .parse::<u64>()
            .ok()
            .and_then(|days| today.checked_sub_days(Days::new(days)))
            .unwrap_or(today);
    }
    if let Some(caps) = iso_date_pattern().captures(&text) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], BUCKET_KEY_FORMAT) {
            return date;
        }
    }

    today
}

/// SHA-256 hex digest of a canonical link.
pub fn content_hash(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable id of a posting with the given canonical link.
pub fn derive_id(rule: &IdentityRule, link: &str) -> String {
    match rule {
        IdentityRule::EmbeddedNumeric(pattern) => pattern
            .captures(link)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| content_hash(link)),
        IdentityRule::ContentHash => content_hash(link),
    }
}

/// Vocabulary terms found in `title`, case-insensitively, in vocabulary
/// order without repeats.
pub fn tag_keywords(title: &str, vocabulary: &[String]) -> Vec<String> {
    let title = title.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for term in vocabulary {
        if term.is_empty() || found.contains(term) {
            continue;
        }
        if title.contains(&term.to_lowercase()) {
            found.push(term.clone());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn card() -> CardFields {
        CardFields::new(
            "Senior Rust Engineer",
            "Acme",
            "Minneapolis, MN 55401",
            "https://example.com/jobs/1",
            "3 days ago",
        )
    }

    fn normalizer() -> CardNormalizer {
        CardNormalizer::new(["Rust", "Python", "senior"], today())
    }

    #[test]
    fn test_relative_dates() {
        assert_eq!(parse_date_posted("Today", today()), date(10));
        assert_eq!(parse_date_posted("Just posted", today()), date(10));
        assert_eq!(parse_date_posted("Yesterday", today()), date(9));
        assert_eq!(parse_date_posted("3 days ago", today()), date(7));
        assert_eq!(parse_date_posted("Posted 1 day ago", today()), date(9));
        assert_eq!(parse_date_posted("30+ days ago", today()), date(10) - chrono::Duration::days(30));
        assert_eq!(parse_date_posted("posted recently", today()), date(10));
    }

    #[test]
    fn test_iso_date_is_taken_as_is() {
        assert_eq!(parse_date_posted("2024-06-03", today()), date(3));
        // Unparseable ISO-shaped text falls back to today
        assert_eq!(parse_date_posted("2024-13-45", today()), date(10));
    }

    #[test]
    fn test_strip_postal_codes() {
        assert_eq!(strip_postal_codes("Minneapolis, MN 55401"), "Minneapolis, MN");
        assert_eq!(strip_postal_codes("  St Paul,  MN 55101 (Hybrid) "), "St Paul, MN (Hybrid)");
        assert_eq!(strip_postal_codes("Remote"), "Remote");
    }

    #[test]
    fn test_normalize_complete_card() {
        let posting = normalizer()
            .normalize(card(), "Indeed", &IdentityRule::ContentHash)
            .unwrap();

        assert_eq!(posting.title(), "Senior Rust Engineer");
        assert_eq!(posting.location(), "Minneapolis, MN");
        assert_eq!(posting.date_posted(), date(7));
        assert_eq!(posting.source(), "Indeed");
        assert_eq!(posting.id(), content_hash("https://example.com/jobs/1"));
        assert_eq!(posting.keywords(), ["Rust", "senior"]);
    }

    #[test]
    fn test_normalize_returns_none_for_each_missing_field() {
        let n = normalizer();
        let blanks: [fn(&mut CardFields); 5] = [
            |c| c.title = " ".into(),
            |c| c.company = String::new(),
            |c| c.location = "55401".into(),
            |c| c.link = String::new(),
            |c| c.date_posted = String::new(),
        ];

        for blank in blanks {
            let mut fields = card();
            blank(&mut fields);
            assert!(n.normalize(fields, "Indeed", &IdentityRule::ContentHash).is_none());
        }
    }

    #[test]
    fn test_relative_link_counts_as_empty() {
        let mut fields = card();
        fields.link = "/jobs/1".into();
        assert!(normalizer()
            .normalize(fields, "Indeed", &IdentityRule::ContentHash)
            .is_none());
    }

    #[test]
    fn test_embedded_numeric_identity() {
        let rule = IdentityRule::EmbeddedNumeric(Regex::new(r"/jobs/view/(?:[^/?#]*-)?(\d+)/?$").unwrap());

        assert_eq!(
            derive_id(&rule, "https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3912345678"),
            "3912345678"
        );
        // No embedded id: falls back to the hash
        let link = "https://www.linkedin.com/company/acme";
        assert_eq!(derive_id(&rule, link), content_hash(link));
    }

    #[test]
    fn test_keywords_follow_vocabulary_order_without_repeats() {
        let vocabulary = vec!["python".to_string(), "Rust".to_string(), "rust".to_string()];
        let normalizer = CardNormalizer::new(vocabulary, today());
        // Exact repeats are dropped at construction; case variants are distinct terms
        assert_eq!(normalizer.vocabulary().len(), 3);

        let found = tag_keywords("Rust and Python Developer", normalizer.vocabulary());
        assert_eq!(found, vec!["python", "Rust", "rust"]);

        let found = tag_keywords("Rust Developer", &["Rust".to_string(), "Rust".to_string()]);
        assert_eq!(found, vec!["Rust"]);
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        let hash = content_hash("https://example.com/jobs/1");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash("https://example.com/jobs/1"));
    }
}

//! The canonical job posting record.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Date format used for bucket keys and persisted dates.
pub const BUCKET_KEY_FORMAT: &str = "%Y-%m-%d";

/// One job listing observed from one source during one run.
///
/// Fields are private: a `JobPosting` can only be obtained through
/// [`JobPosting::from_parts`] (or the normalizer), which refuses any record
/// with an empty required field. Field names on the wire follow the
/// persisted document layout (`job_title`, `company_name`, ...). Decoding
/// goes through the same check, so stored records are validated on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PostingRecord")]
pub struct JobPosting {
    #[serde(rename = "job_title")]
    title: String,

    #[serde(rename = "company_name")]
    company: String,

    #[serde(rename = "job_location")]
    location: String,

    #[serde(rename = "job_link")]
    link: String,

    date_posted: NaiveDate,

    #[serde(rename = "job_id")]
    id: String,

    source: String,

    #[serde(default)]
    keywords: Vec<String>,
}

/// Parts for constructing a [`JobPosting`].
#[derive(Debug, Clone, Default)]
pub struct NewPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub date_posted: Option<NaiveDate>,
    pub id: String,
    pub source: String,
    pub keywords: Vec<String>,
}

/// Wire shape of a stored posting, before validation.
#[derive(Deserialize)]
struct PostingRecord {
    job_title: String,
    company_name: String,
    job_location: String,
    job_link: String,
    date_posted: NaiveDate,
    job_id: String,
    source: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl TryFrom<PostingRecord> for JobPosting {
    type Error = String;

    fn try_from(record: PostingRecord) -> Result<Self, Self::Error> {
        let id = record.job_id.clone();
        JobPosting::from_parts(NewPosting {
            title: record.job_title,
            company: record.company_name,
            location: record.job_location,
            link: record.job_link,
            date_posted: Some(record.date_posted),
            id: record.job_id,
            source: record.source,
            keywords: record.keywords,
        })
        .ok_or_else(|| format!("posting {:?} has an empty required field", id))
    }
}

impl JobPosting {
    /// Build a posting, returning `None` if any required field is empty.
    pub fn from_parts(parts: NewPosting) -> Option<Self> {
        let required = [
            &parts.title,
            &parts.company,
            &parts.location,
            &parts.link,
            &parts.id,
            &parts.source,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return None;
        }

        Some(Self {
            title: parts.title,
            company: parts.company,
            location: parts.location,
            link: parts.link,
            date_posted: parts.date_posted?,
            id: parts.id,
            source: parts.source,
            keywords: parts.keywords,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn date_posted(&self) -> NaiveDate {
        self.date_posted
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// ISO date key of the bucket this posting belongs to.
    pub fn bucket_key(&self) -> String {
        self.date_posted.format(BUCKET_KEY_FORMAT).to_string()
    }
}

/// How a source derives the stable identifier of a posting.
#[derive(Debug, Clone)]
pub enum IdentityRule {
    /// SHA-256 hex digest of the canonical link.
    ContentHash,

    /// Numeric ID embedded in the link, captured by group 1 of the pattern.
    /// Falls back to the content hash when the link carries no match.
    EmbeddedNumeric(Regex),
}

impl Default for IdentityRule {
    fn default() -> Self {
        Self::ContentHash
    }
}

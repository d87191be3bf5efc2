//! Typed errors for the job scraper.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Only [`ConfigError`]
//! is fatal; fetch and persistence failures are recovered where they occur
//! and degrade to smaller result sets.

use thiserror::Error;

/// Invalid or missing search configuration. Aborts a run before any
/// network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No job titles configured
    #[error("no job titles configured")]
    NoTitles,

    /// No job levels configured
    #[error("no job levels configured")]
    NoLevels,

    /// A title or level entry is blank
    #[error("blank {field} entry at position {index}")]
    BlankEntry { field: &'static str, index: usize },

    /// No source is enabled
    #[error("no sources enabled")]
    NoSources,

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A single value is out of range or malformed
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// A source's underlying fetch failed. Recovered by the aggregator as
/// "zero results" for the (source, term) pair.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-success status code
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The bounded wait elapsed
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// The store failed to upsert one bucket. Reported per bucket; other
/// buckets are still attempted.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Transport-level failure talking to the store
    #[error("store request failed for bucket {bucket}: {source}")]
    Request {
        bucket: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Store answered with a non-success status
    #[error("store rejected bucket {bucket}: HTTP {status}")]
    Rejected { bucket: String, status: u16 },

    /// Bucket could not be encoded
    #[error("failed to encode bucket {bucket}: {source}")]
    Encode {
        bucket: String,
        #[source]
        source: serde_json::Error,
    },

    /// Database backend error
    #[error("database error for bucket {bucket}: {message}")]
    Database { bucket: String, message: String },
}

/// Umbrella error for building sources from config.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, PersistenceError>;

//! Scraper configuration: a JSON file plus environment overrides.

use dotenvy::dotenv;
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::aggregate::SearchRequest;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "SCRAPER_CONFIG";

const DATABASE_URL_VAR: &str = "FIREBASE_DATABASE_URL";
const AUTH_TOKEN_VAR: &str = "FIREBASE_AUTH_TOKEN";
const LOCATION_VAR: &str = "SCRAPER_LOCATION";

fn default_location() -> String {
    "United States".to_string()
}

fn default_collection() -> String {
    "jobs".to_string()
}

fn default_true() -> bool {
    true
}

/// Smallest gap allowed between two requests to one source.
pub const MIN_REQUEST_GAP_MS: u64 = 1000;

fn default_request_gap_ms() -> u64 {
    MIN_REQUEST_GAP_MS
}

fn default_timeout_secs() -> u64 {
    30
}

/// Top-level configuration. Read once at run start.
#[derive(Debug, Deserialize)]
pub struct ScraperConfig {
    pub search: SearchSettings,

    /// Keyword categories; terms are flattened in file order.
    #[serde(default)]
    pub keywords: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub sources: SourcesConfig,

    /// Remote store. Without one, results stay in memory.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Minimum gap between requests to one source
    #[serde(default = "default_request_gap_ms")]
    pub request_gap_ms: u64,

    /// Bound on a single request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub job_title: Vec<String>,

    #[serde(default)]
    pub job_level: Vec<String>,

    #[serde(default = "default_location")]
    pub location: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub linkedin: SourceSettings,

    #[serde(default)]
    pub indeed: SourceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override the board's search endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Only ever read from the environment
    #[serde(skip)]
    pub auth_token: Option<SecretString>,
}

impl ScraperConfig {
    /// Read and parse a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load `path`, apply environment overrides and validate.
    ///
    /// A `.env` file is loaded first if present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let _ = dotenv();

        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup` (an environment, or a map in tests).
    ///
    /// A database URL override creates the database section if the file has
    /// none. The auth token only attaches to a configured database.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(location) = lookup(LOCATION_VAR).filter(|v| !v.trim().is_empty()) {
            self.search.location = location.trim().to_string();
        }

        if let Some(url) = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            match &mut self.database {
                Some(database) => database.url = url,
                None => {
                    self.database = Some(DatabaseConfig {
                        url,
                        collection: default_collection(),
                        auth_token: None,
                    })
                }
            }
        }

        if let Some(database) = &mut self.database {
            if let Some(token) = lookup(AUTH_TOKEN_VAR).filter(|v| !v.is_empty()) {
                database.auth_token = Some(SecretString::from(token));
            }
        }
    }

    /// Check everything a run needs before any network activity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::pipeline::terms::SearchTermBuilder::build(
            &self.search.job_title,
            &self.search.job_level,
        )?;

        if !self.sources.linkedin.enabled && !self.sources.indeed.enabled {
            return Err(ConfigError::NoSources);
        }
        if self.request_gap_ms < MIN_REQUEST_GAP_MS {
            return Err(ConfigError::invalid(
                "request_gap_ms",
                format!("must be at least {}", MIN_REQUEST_GAP_MS),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be greater than zero"));
        }
        if let Some(database) = &self.database {
            url::Url::parse(&database.url)
                .map_err(|e| ConfigError::invalid("database.url", e.to_string()))?;
            if database.collection.trim().is_empty() {
                return Err(ConfigError::invalid("database.collection", "must not be empty"));
            }
        }
        Ok(())
    }

    /// Keyword vocabulary: all category terms in file order, first
    /// occurrence kept.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for term in self.keywords.values().flatten() {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }

    /// What one aggregation run searches for.
    pub fn search_request(&self) -> SearchRequest {
        SearchRequest::new(self.search.job_title.clone(), self.search.job_level.clone())
            .with_vocabulary(self.vocabulary())
    }

    pub fn request_gap(&self) -> Duration {
        Duration::from_millis(self.request_gap_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    const CONFIG: &str = r#"{
        "search": {
            "job_title": ["Software Engineer", "Data Analyst"],
            "job_level": ["Intern"]
        },
        "keywords": {
            "languages": ["Python", "Rust", "SQL"],
            "data": ["SQL", "Tableau"]
        },
        "sources": { "indeed": { "enabled": false } },
        "request_gap_ms": 1500
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = ScraperConfig::from_json_str(CONFIG).unwrap();

        assert_eq!(config.search.location, "United States");
        assert!(config.sources.linkedin.enabled);
        assert!(!config.sources.indeed.enabled);
        assert!(config.database.is_none());
        assert_eq!(config.request_gap(), Duration::from_millis(1500));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_vocabulary_flattens_in_file_order_without_repeats() {
        let config = ScraperConfig::from_json_str(CONFIG).unwrap();
        assert_eq!(config.vocabulary(), vec!["Python", "Rust", "SQL", "Tableau"]);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ScraperConfig::from_json_str(CONFIG).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("SCRAPER_LOCATION", "Canada"),
            ("FIREBASE_DATABASE_URL", "https://example.firebaseio.com"),
            ("FIREBASE_AUTH_TOKEN", "s3cret"),
        ]);

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.search.location, "Canada");
        let database = config.database.as_ref().unwrap();
        assert_eq!(database.url, "https://example.firebaseio.com");
        assert_eq!(database.collection, "jobs");
        assert_eq!(database.auth_token.as_ref().unwrap().expose_secret(), "s3cret");
    }

    #[test]
    fn test_token_is_not_read_from_file() {
        let raw = r#"{
            "search": { "job_title": ["a"], "job_level": ["b"] },
            "database": { "url": "https://x.firebaseio.com", "auth_token": "leaked" }
        }"#;
        let config = ScraperConfig::from_json_str(raw).unwrap();
        assert!(config.database.unwrap().auth_token.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut config = ScraperConfig::from_json_str(CONFIG).unwrap();
        config.search.job_level.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoLevels)));

        let mut config = ScraperConfig::from_json_str(CONFIG).unwrap();
        config.sources.linkedin.enabled = false;
        assert!(matches!(config.validate(), Err(ConfigError::NoSources)));

        let mut config = ScraperConfig::from_json_str(CONFIG).unwrap();
        config.apply_overrides(|key| (key == "FIREBASE_DATABASE_URL").then(|| "not a url".to_string()));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        for gap in [0, 999] {
            let mut config = ScraperConfig::from_json_str(CONFIG).unwrap();
            config.request_gap_ms = gap;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref key, .. }) if key == "request_gap_ms"
            ));
        }
    }

    #[test]
    fn test_default_gap_is_the_minimum() {
        let raw = r#"{ "search": { "job_title": ["a"], "job_level": ["b"] } }"#;
        let config = ScraperConfig::from_json_str(raw).unwrap();
        assert_eq!(config.request_gap(), Duration::from_secs(1));
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ScraperConfig::from_file("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ScraperConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}

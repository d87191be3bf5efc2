//! Firebase Realtime Database store.
//!
//! Each bucket is a child of the collection node:
//! `{url}/{collection}/{YYYY-MM-DD}.json`. Postings are keyed by id and
//! written with `PATCH`, which merges children, so a posting stored by an
//! earlier run stays in place and a repeated push changes nothing.

use async_trait::async_trait;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::DatabaseConfig;
use crate::error::{ConfigError, PersistenceError, StoreResult};
use crate::traits::store::JobStore;
use crate::types::posting::JobPosting;

pub struct FirebaseStore {
    client: reqwest::Client,
    base_url: Url,
    collection: String,
    auth_token: Option<SecretString>,
}

impl FirebaseStore {
    /// Create a store for `database_url`, e.g.
    /// `https://<project>.firebaseio.com`.
    pub fn new(database_url: &str, collection: impl Into<String>) -> Result<Self, ConfigError> {
        let mut base_url = Url::parse(database_url)
            .map_err(|e| ConfigError::invalid("database.url", e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::invalid("database", e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            collection: collection.into().trim_matches('/').to_string(),
            auth_token: None,
        })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, ConfigError> {
        let mut store = Self::new(&config.url, config.collection.clone())?;
        store.auth_token = config
            .auth_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string()));
        Ok(store)
    }

    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// REST URL of one bucket (without the auth parameter).
    pub fn bucket_url(&self, key: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("{}/{}.json", self.collection, key))
    }
}

#[async_trait]
impl JobStore for FirebaseStore {
    async fn upsert_bucket(&self, key: &str, postings: &[JobPosting]) -> StoreResult<()> {
        let mut url = self.bucket_url(key).map_err(|e| PersistenceError::Request {
            bucket: key.to_string(),
            source: Box::new(e),
        })?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token.expose_secret());
        }

        let body: IndexMap<&str, &JobPosting> = postings.iter().map(|p| (p.id(), p)).collect();
        let body = serde_json::to_vec(&body).map_err(|source| PersistenceError::Encode {
            bucket: key.to_string(),
            source,
        })?;

        debug!(bucket = %key, postings = postings.len(), "PATCH bucket");
        let response = self
            .client
            .patch(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PersistenceError::Request {
                bucket: key.to_string(),
                source: Box::new(e.without_url()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersistenceError::Rejected {
                bucket: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

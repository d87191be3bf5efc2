//! SQLite job store.
//!
//! One row per (bucket, job id) holding the posting as JSON. Upserts run in
//! a transaction per bucket.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{PersistenceError, StoreResult};
use crate::traits::store::JobStore;
use crate::types::posting::JobPosting;

const SCHEMA_BUCKET: &str = "<schema>";

pub struct SqliteStore {
    pool: SqlitePool,
}

fn database_error(bucket: &str, e: sqlx::Error) -> PersistenceError {
    PersistenceError::Database {
        bucket: bucket.to_string(),
        message: e.to_string(),
    }
}

impl SqliteStore {
    /// Open a store.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://jobs.db?mode=rwc` - File-based, created if missing
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| database_error(SCHEMA_BUCKET, e))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// In-memory store. A single connection, since each connection to
    /// `:memory:` is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| database_error(SCHEMA_BUCKET, e))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_postings (
                bucket TEXT NOT NULL,
                job_id TEXT NOT NULL,
                source TEXT NOT NULL,
                posting TEXT NOT NULL,
                PRIMARY KEY (bucket, job_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| database_error(SCHEMA_BUCKET, e))?;

        Ok(())
    }

    /// Postings of one bucket, ordered by job id.
    pub async fn list_bucket(&self, bucket: &str) -> StoreResult<Vec<JobPosting>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT posting FROM job_postings WHERE bucket = ? ORDER BY job_id")
                .bind(bucket)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| database_error(bucket, e))?;

        rows.into_iter()
            .map(|(json,)| {
                serde_json::from_str(&json).map_err(|source| PersistenceError::Encode {
                    bucket: bucket.to_string(),
                    source,
                })
            })
            .collect()
    }
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn upsert_bucket(&self, key: &str, postings: &[JobPosting]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| database_error(key, e))?;

        for posting in postings {
            let json = serde_json::to_string(posting).map_err(|source| PersistenceError::Encode {
                bucket: key.to_string(),
                source,
            })?;

            sqlx::query(
                r#"
                INSERT INTO job_postings (bucket, job_id, source, posting)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(bucket, job_id) DO UPDATE SET
                    source = excluded.source,
                    posting = excluded.posting
                "#,
            )
            .bind(key)
            .bind(posting.id())
            .bind(posting.source())
            .bind(&json)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error(key, e))?;
        }

        tx.commit().await.map_err(|e| database_error(key, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::posting;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_upsert_and_list() {
        let store = SqliteStore::in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        store
            .upsert_bucket("2024-06-10", &[posting("a", "Acme", today)])
            .await
            .unwrap();
        store
            .upsert_bucket(
                "2024-06-10",
                &[posting("a", "Acme Corp", today), posting("b", "Beta", today)],
            )
            .await
            .unwrap();

        let bucket = store.list_bucket("2024-06-10").await.unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[0].company(), "Acme Corp");
        assert!(store.list_bucket("2024-06-09").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_stored_posting_with_blank_field() {
        let store = SqliteStore::in_memory().await.unwrap();
        let raw = r#"{"job_title":"Engineer","company_name":"","job_location":"Remote","job_link":"https://example.com/jobs/x","date_posted":"2024-06-10","job_id":"x","source":"Mock"}"#;

        sqlx::query("INSERT INTO job_postings (bucket, job_id, source, posting) VALUES (?, ?, ?, ?)")
            .bind("2024-06-10")
            .bind("x")
            .bind("Mock")
            .bind(raw)
            .execute(&store.pool)
            .await
            .unwrap();

        let result = store.list_bucket("2024-06-10").await;
        assert!(matches!(result, Err(PersistenceError::Encode { .. })));
    }
}

//! # expo-db
//!
//! libSQL-backed document store and repositories for Expo.
//!
//! Every collection is a table of serde-JSON documents. Documents embed
//! summaries of each other; [`propagation`] keeps those copies in step with
//! their source after each write, and [`outbox`] retries the copies that could
//! not be written.

pub mod error;
pub mod external;
pub mod helpers;
mod migrations;
pub mod outbox;
pub mod propagation;
pub mod repos;
pub mod retry;
pub mod service;
pub mod store;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;
use libsql::params::IntoParams;
use retry::{RetryConfig, is_transient_error};

/// Central database handle.
///
/// Wraps a libSQL database and connection. Repositories go through
/// [`ExpoDb::execute_with`] and [`ExpoDb::query_with`] so lock contention is
/// retried in one place.
pub struct ExpoDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    retry: RetryConfig,
}

impl ExpoDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations and seeds the default role on every open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let expo_db = Self {
            db,
            conn,
            retry: RetryConfig::default(),
        };
        expo_db.run_migrations().await?;
        expo_db.seed_default_role().await?;
        tracing::debug!(path, "database opened");
        Ok(expo_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL, e.g. `"prj-3f0c…"` (32 hex chars).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .query_with("SELECT ?1 || '-' || lower(hex(randomblob(16)))", || [prefix])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Execute a statement, retrying transient lock errors.
    ///
    /// `params` is called once per attempt since libSQL consumes parameters.
    ///
    /// # Errors
    ///
    /// Returns the last `DatabaseError` once retries are exhausted, or the
    /// first non-transient error.
    pub async fn execute_with<P, F>(&self, sql: &str, params: F) -> Result<u64, DatabaseError>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let mut attempt = 1;
        loop {
            match self.conn.execute(sql, params()).await {
                Ok(n) => return Ok(n),
                Err(e) if attempt < self.retry.max_attempts && is_transient_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(attempt, ?delay, error = %e, "transient error, retrying execute");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run a query, retrying transient lock errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute_with`].
    pub async fn query_with<P, F>(&self, sql: &str, params: F) -> Result<libsql::Rows, DatabaseError>
    where
        P: IntoParams,
        F: Fn() -> P,
    {
        let mut attempt = 1;
        loop {
            match self.conn.query(sql, params()).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < self.retry.max_attempts && is_transient_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(attempt, ?delay, error = %e, "transient error, retrying query");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> ExpoDb {
        ExpoDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        let tables = [
            "users",
            "roles",
            "exhibitions",
            "projects",
            "reviews",
            "companies",
            "classes",
            "knowledge",
            "fanout_outbox",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            assert!(rows.next().await.unwrap().is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("prj").await.unwrap();
        assert!(id.starts_with("prj-"), "ID should start with 'prj-': {id}");
        assert_eq!(id.len(), 36, "3 prefix + 1 dash + 32 hex: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in expo_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations_and_seed() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        db.seed_default_role().await.unwrap();

        let mut rows = db
            .conn()
            .query("SELECT COUNT(*) FROM roles", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn documents_must_be_valid_json() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute("INSERT INTO companies (id, doc) VALUES ('cmp-1', 'not json')", ())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn email_index_is_case_insensitive() {
        let db = test_db().await;
        db.conn()
            .execute(
                r#"INSERT INTO users (id, doc) VALUES ('usr-1', '{"email":"Ana@Example.com"}')"#,
                (),
            )
            .await
            .unwrap();
        let dup = db
            .conn()
            .execute(
                r#"INSERT INTO users (id, doc) VALUES ('usr-2', '{"email":"ana@example.com"}')"#,
                (),
            )
            .await;
        assert!(dup.is_err());
    }
}

//! Service layer orchestrating validation, primary writes and fan-out.
//!
//! `ExpoService` wraps `ExpoDb` (document access) and the injected
//! collaborators. All repository methods are implemented as `impl ExpoService`
//! in [`crate::repos`].

use std::sync::Arc;

use expo_config::ExpoConfig;
use expo_core::validation::ValidationRules;

use crate::ExpoDb;
use crate::error::{DatabaseError, RepoError};
use crate::external::{
    AccessLinkIssuer, BlobStore, Collaborators, HttpMailer, LogOnlyMailer, Mailer,
    ObjectStoreBlobs, StaticLinkIssuer,
};
use crate::retry::RetryConfig;

/// Every mutation follows the same protocol:
/// 1. Validate inputs (no write on failure)
/// 2. Primary write (failure aborts)
/// 3. Fan-out of embedded summaries (failures are collected and queued in the
///    outbox, never undone)
pub struct ExpoService {
    db: ExpoDb,
    blobs: Arc<dyn BlobStore>,
    mailer: Arc<dyn Mailer>,
    links: Arc<dyn AccessLinkIssuer>,
    rules: ValidationRules,
    outbox_retry: RetryConfig,
}

impl ExpoService {
    /// Open a local database and wrap it with the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str, collaborators: Collaborators) -> Result<Self, DatabaseError> {
        let db = ExpoDb::open_local(db_path).await?;
        Ok(Self::from_db(db, collaborators))
    }

    /// Create from an existing `ExpoDb`.
    #[must_use]
    pub fn from_db(db: ExpoDb, collaborators: Collaborators) -> Self {
        Self {
            db,
            blobs: collaborators.blobs,
            mailer: collaborators.mailer,
            links: collaborators.links,
            rules: ValidationRules::default(),
            outbox_retry: RetryConfig::from_outbox(&expo_config::OutboxConfig::default()),
        }
    }

    /// Build everything from configuration: database, blob backend, mailer,
    /// link issuer, validation tolerance and outbox schedule.
    ///
    /// Without a complete `[mail]` section, access links are only logged.
    ///
    /// # Errors
    ///
    /// Returns `RepoError` if the database cannot be opened or a section is
    /// invalid.
    pub async fn from_config(config: &ExpoConfig) -> Result<Self, RepoError> {
        let blobs: Arc<dyn BlobStore> = Arc::new(ObjectStoreBlobs::from_config(&config.storage)?);
        let mailer: Arc<dyn Mailer> = if config.mail.is_configured() {
            Arc::new(HttpMailer::from_config(&config.mail)?)
        } else {
            tracing::warn!("mail section incomplete; access links will only be logged");
            Arc::new(LogOnlyMailer)
        };
        let links: Arc<dyn AccessLinkIssuer> =
            Arc::new(StaticLinkIssuer::new(config.mail.access_link_base.clone()));
        let rules = config
            .validation
            .rules()
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;

        let db = ExpoDb::open_local(&config.database.path).await?;
        Ok(Self::from_db(db, Collaborators { blobs, mailer, links })
            .with_rules(rules)
            .with_outbox_retry(RetryConfig::from_outbox(&config.outbox)))
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_outbox_retry(mut self, retry: RetryConfig) -> Self {
        self.outbox_retry = retry;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &ExpoDb {
        &self.db
    }

    #[must_use]
    pub const fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    #[must_use]
    pub const fn outbox_retry(&self) -> &RetryConfig {
        &self.outbox_retry
    }

    pub(crate) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub(crate) fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub(crate) fn links(&self) -> &dyn AccessLinkIssuer {
        self.links.as_ref()
    }

    /// Delete a replaced blob. Failures are logged and otherwise ignored.
    pub(crate) async fn delete_blob_best_effort(&self, url: &str) {
        if let Err(e) = self.blobs.delete(url).await {
            tracing::warn!(url, error = %e, "could not delete replaced blob");
        }
    }
}

//! Error types for expo-db.

use expo_core::enums::EntityType;
use expo_core::validation::ValidationError;
use thiserror::Error;

use crate::external::blob::BlobError;
use crate::external::mail::MailError;
use crate::propagation::PropagationError;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A conditional write matched nothing, or stored data is inconsistent.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Query(format!("document (de)serialization failed: {e}"))
    }
}

/// Errors returned by repository operations on `ExpoService`.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityType, id: String },

    /// Raised before any write.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Permission denied: {0}")]
    Permission(String),

    /// The primary write committed; some summaries may be stale until the
    /// outbox is reconciled.
    #[error(transparent)]
    Propagation(#[from] PropagationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Blob storage failed: {0}")]
    Storage(#[from] BlobError),

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),
}

impl From<libsql::Error> for RepoError {
    fn from(e: libsql::Error) -> Self {
        Self::Database(e.into())
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Database(e.into())
    }
}

impl RepoError {
    pub fn not_found(entity: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// HTTP status the route layer should answer with.
    #[must_use]
    pub const fn status_hint(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(
                ValidationError::DuplicateEmail(_) | ValidationError::RoleInUse { .. },
            ) => 409,
            Self::Validation(_) => 400,
            Self::Permission(_) => 403,
            Self::Storage(_) | Self::Mail(_) => 502,
            Self::Propagation(_) | Self::Database(_) => 500,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

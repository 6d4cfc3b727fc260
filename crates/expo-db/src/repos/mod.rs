//! Repository methods on `ExpoService`, one module per collection.

pub mod class;
pub mod company;
pub mod exhibition;
pub mod knowledge;
pub mod project;
pub mod review;
pub mod role;
pub mod user;

use crate::error::RepoError;
use crate::service::ExpoService;
use crate::store::{DocFilter, Document};

impl ExpoService {
    /// Fetch a document or fail with `NotFound` for its entity.
    pub(crate) async fn fetch<T: Document>(&self, id: &str) -> Result<T, RepoError> {
        self.db()
            .find_by_id::<T>(id)
            .await?
            .ok_or_else(|| RepoError::not_found(T::COLLECTION.entity(), id))
    }

    pub(crate) async fn fetch_all<T: Document>(&self) -> Result<Vec<T>, RepoError> {
        Ok(self.db().find_many::<T>(&DocFilter::new()).await?)
    }
}

/// Whether a write failed on a UNIQUE index.
pub(crate) fn is_unique_violation(error: &crate::error::DatabaseError) -> bool {
    error.to_string().contains("UNIQUE constraint failed")
}

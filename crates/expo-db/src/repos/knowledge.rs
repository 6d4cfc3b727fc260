//! Knowledge areas a user can declare.

use serde_json::json;

use expo_core::entities::Knowledge;
use expo_core::enums::EntityType;
use expo_core::ids::PREFIX_KNOWLEDGE;
use expo_core::validation::check_not_blank;

use crate::error::RepoError;
use crate::service::ExpoService;
use crate::store::Collection;

impl ExpoService {
    /// # Errors
    ///
    /// Returns `RepoError::Validation` for a blank name.
    pub async fn create_knowledge(&self, name: &str) -> Result<Knowledge, RepoError> {
        check_not_blank("name", name)?;
        let knowledge = Knowledge {
            id: self.db().generate_id(PREFIX_KNOWLEDGE).await?,
            name: name.trim().to_string(),
        };
        self.db().insert(&knowledge).await?;
        Ok(knowledge)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the entry does not exist.
    pub async fn get_knowledge(&self, id: &str) -> Result<Knowledge, RepoError> {
        self.fetch(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_knowledge(&self) -> Result<Vec<Knowledge>, RepoError> {
        self.fetch_all().await
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` or `RepoError::Validation`.
    pub async fn rename_knowledge(&self, id: &str, name: &str) -> Result<Knowledge, RepoError> {
        check_not_blank("name", name)?;
        if self
            .db()
            .update_fields(Collection::Knowledge, id, &json!({ "name": name.trim() }))
            .await?
            == 0
        {
            return Err(RepoError::not_found(EntityType::Knowledge, id));
        }
        self.get_knowledge(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the entry does not exist.
    pub async fn delete_knowledge(&self, id: &str) -> Result<(), RepoError> {
        match self.db().delete(Collection::Knowledge, id).await? {
            0 => Err(RepoError::not_found(EntityType::Knowledge, id)),
            _ => Ok(()),
        }
    }
}

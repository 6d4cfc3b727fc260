//! Company catalogue.

use serde_json::json;

use expo_core::entities::Company;
use expo_core::enums::EntityType;
use expo_core::ids::PREFIX_COMPANY;
use expo_core::validation::check_not_blank;

use crate::error::RepoError;
use crate::service::ExpoService;
use crate::store::Collection;

impl ExpoService {
    /// # Errors
    ///
    /// Returns `RepoError::Validation` for a blank name.
    pub async fn create_company(&self, name: &str) -> Result<Company, RepoError> {
        check_not_blank("name", name)?;
        let company = Company {
            id: self.db().generate_id(PREFIX_COMPANY).await?,
            name: name.trim().to_string(),
        };
        self.db().insert(&company).await?;
        tracing::info!(company_id = %company.id, "company created");
        Ok(company)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the company does not exist.
    pub async fn get_company(&self, id: &str) -> Result<Company, RepoError> {
        self.fetch(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_companies(&self) -> Result<Vec<Company>, RepoError> {
        self.fetch_all().await
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` or `RepoError::Validation`.
    pub async fn rename_company(&self, id: &str, name: &str) -> Result<Company, RepoError> {
        check_not_blank("name", name)?;
        let written = self
            .db()
            .update_fields(Collection::Companies, id, &json!({ "name": name.trim() }))
            .await?;
        if written == 0 {
            return Err(RepoError::not_found(EntityType::Company, id));
        }
        self.get_company(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the company does not exist.
    pub async fn delete_company(&self, id: &str) -> Result<(), RepoError> {
        if self.db().delete(Collection::Companies, id).await? == 0 {
            return Err(RepoError::not_found(EntityType::Company, id));
        }
        tracing::info!(company_id = id, "company deleted");
        Ok(())
    }
}

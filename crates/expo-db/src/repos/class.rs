//! School classes.

use expo_core::entities::SchoolClass;
use expo_core::enums::EntityType;
use expo_core::ids::PREFIX_CLASS;
use expo_core::validation::check_not_blank;

use crate::error::RepoError;
use crate::service::ExpoService;
use crate::store::Collection;

impl ExpoService {
    /// # Errors
    ///
    /// Returns `RepoError::Validation` for a blank name or year.
    pub async fn create_class(&self, name: &str, year: &str) -> Result<SchoolClass, RepoError> {
        check_not_blank("name", name)?;
        check_not_blank("year", year)?;
        let class = SchoolClass {
            id: self.db().generate_id(PREFIX_CLASS).await?,
            name: name.trim().to_string(),
            year: year.trim().to_string(),
        };
        self.db().insert(&class).await?;
        tracing::info!(class_id = %class.id, "class created");
        Ok(class)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the class does not exist.
    pub async fn get_class(&self, id: &str) -> Result<SchoolClass, RepoError> {
        self.fetch(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_classes(&self) -> Result<Vec<SchoolClass>, RepoError> {
        self.fetch_all().await
    }

    /// Change the name and/or year; `None` leaves a field as is.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` or `RepoError::Validation`.
    pub async fn update_class(
        &self,
        id: &str,
        name: Option<&str>,
        year: Option<&str>,
    ) -> Result<SchoolClass, RepoError> {
        let mut class = self.get_class(id).await?;
        if let Some(name) = name {
            check_not_blank("name", name)?;
            class.name = name.trim().to_string();
        }
        if let Some(year) = year {
            check_not_blank("year", year)?;
            class.year = year.trim().to_string();
        }
        if self.db().replace(&class).await? == 0 {
            return Err(RepoError::not_found(EntityType::Class, id));
        }
        Ok(class)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the class does not exist.
    pub async fn delete_class(&self, id: &str) -> Result<(), RepoError> {
        if self.db().delete(Collection::Classes, id).await? == 0 {
            return Err(RepoError::not_found(EntityType::Class, id));
        }
        tracing::info!(class_id = id, "class deleted");
        Ok(())
    }
}

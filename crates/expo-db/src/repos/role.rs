//! Role repository: permission sets and their embedded copies.

use serde::Deserialize;

use expo_core::entities::{Role, RoleSummary};
use expo_core::enums::{EntityType, Permission};
use expo_core::identity::ActorContext;
use expo_core::ids::{DEFAULT_ROLE_ID, PREFIX_ROLE};
use expo_core::validation::{ValidationError, check_not_blank, check_permissions};

use crate::error::RepoError;
use crate::propagation::FanoutStep;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};
use crate::updates::role::RoleUpdate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRole {
    pub name: String,
    /// Defaults to the reviewer permissions when empty.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl ExpoService {
    /// Create a role.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Validation` for a blank name or an unknown
    /// permission, `RepoError::Database` if the INSERT fails.
    pub async fn create_role(&self, input: NewRole) -> Result<Role, RepoError> {
        check_not_blank("role name", &input.name)?;
        let permissions = if input.permissions.is_empty() {
            Permission::default_strings()
        } else {
            input.permissions
        };
        check_permissions(&permissions)?;

        let role = Role {
            id: self.db().generate_id(PREFIX_ROLE).await?,
            name: input.name,
            permissions,
        };
        self.db().insert(&role).await?;
        tracing::info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the role does not exist.
    pub async fn get_role(&self, id: &str) -> Result<Role, RepoError> {
        self.fetch(id).await
    }

    /// Resolve a role the actor wants to assign. The actor must hold every
    /// permission the role grants.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the role does not exist,
    /// `RepoError::Permission` if the actor's permissions do not cover it.
    pub async fn get_role_for(&self, actor: &ActorContext, id: &str) -> Result<Role, RepoError> {
        let role = self.get_role(id).await?;
        if !actor.holds_all(&role.permissions) {
            return Err(RepoError::Permission(format!(
                "role '{}' grants permissions that '{}' does not hold",
                role.id, actor.user_id
            )));
        }
        Ok(role)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the default role was never seeded.
    pub async fn default_role(&self) -> Result<Role, RepoError> {
        self.get_role(DEFAULT_ROLE_ID).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_roles(&self) -> Result<Vec<Role>, RepoError> {
        self.fetch_all().await
    }

    /// Rename a role or change its permissions, then refresh the copies held
    /// by users, exhibitions and reviews. Exhibition weights are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound`, `RepoError::Validation`, or
    /// `RepoError::Propagation` if a copy could not be refreshed.
    pub async fn update_role(&self, id: &str, update: RoleUpdate) -> Result<Role, RepoError> {
        let mut role = self.get_role(id).await?;
        if let Some(name) = update.name {
            check_not_blank("role name", &name)?;
            role.name = name;
        }
        if let Some(permissions) = update.permissions {
            check_permissions(&permissions)?;
            role.permissions = permissions;
        }

        if self.db().replace(&role).await? == 0 {
            return Err(RepoError::not_found(EntityType::Role, id));
        }
        tracing::info!(role_id = %role.id, "role updated");

        let steps = vec![
            FanoutStep::SyncRoleInUsers {
                role: RoleSummary::from(&role),
            },
            FanoutStep::SyncRoleInExhibitions {
                role_id: role.id.clone(),
                name: role.name.clone(),
            },
            FanoutStep::SyncRoleInReviews {
                role_id: role.id.clone(),
                name: role.name.clone(),
            },
        ];
        self.propagate(EntityType::Role, &role.id, steps).await?;
        Ok(role)
    }

    /// Delete a role nothing references. Nothing is cascaded.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Validation` for the default role or a role still
    /// referenced by a user, exhibition or review, `RepoError::NotFound` if
    /// the role does not exist.
    pub async fn delete_role(&self, id: &str) -> Result<(), RepoError> {
        if id == DEFAULT_ROLE_ID {
            return Err(ValidationError::DefaultRoleProtected.into());
        }
        self.get_role(id).await?;

        let references = [
            (Collection::Users, DocFilter::new().eq("$.role.id", id)),
            (
                Collection::Exhibitions,
                DocFilter::new().any_element("$.roles", "$.id", id),
            ),
            (Collection::Reviews, DocFilter::new().eq("$.user.role.id", id)),
        ];
        for (collection, filter) in references {
            let count = self.db().count(collection, &filter).await?;
            if count > 0 {
                return Err(ValidationError::RoleInUse {
                    role_id: id.to_string(),
                    entity: collection.entity(),
                    count: usize::try_from(count).unwrap_or(usize::MAX),
                }
                .into());
            }
        }

        self.db().delete(Collection::Roles, id).await?;
        tracing::info!(role_id = id, "role deleted");
        Ok(())
    }
}

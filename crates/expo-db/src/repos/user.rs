//! User repository: accounts, role assignment, favorites.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use expo_core::entities::{RoleSummary, User};
use expo_core::enums::EntityType;
use expo_core::identity::ActorContext;
use expo_core::ids::PREFIX_USER;
use expo_core::validation::{ValidationError, check_not_blank};

use crate::error::RepoError;
use crate::propagation::FanoutStep;
use crate::repos::is_unique_violation;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};
use crate::updates::user::UserUpdate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    /// `None` assigns the default role.
    pub role_id: Option<String>,
    pub profile_picture: Option<String>,
    pub knowledge: Option<String>,
    pub age: Option<u32>,
    pub company: Option<String>,
    pub class_name: Option<String>,
}

impl ExpoService {
    /// Create a user and e-mail them an access link.
    ///
    /// If the e-mail cannot be sent the user is deleted again.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Permission` if `actor` may not assign the requested
    /// role, `RepoError::Validation` for blank fields or a duplicate e-mail,
    /// `RepoError::Mail` if the access link could not be delivered.
    pub async fn create_user(&self, actor: &ActorContext, input: NewUser) -> Result<User, RepoError> {
        check_not_blank("name", &input.name)?;
        check_not_blank("email", &input.email)?;
        let role = match &input.role_id {
            Some(role_id) => self.get_role_for(actor, role_id).await?,
            None => self.default_role().await?,
        };

        let email = input.email.trim().to_string();
        self.ensure_email_free(&email, None).await?;

        let user = User {
            id: self.db().generate_id(PREFIX_USER).await?,
            email,
            password_hash: input.password_hash,
            name: input.name,
            phone: input.phone,
            role: RoleSummary::from(&role),
            profile_picture: input.profile_picture,
            knowledge: input.knowledge,
            age: input.age,
            company: input.company,
            class_name: input.class_name,
            project: None,
            reviews: vec![],
            favorited_projects: vec![],
            deactivation_date: None,
        };
        match self.db().insert(&user).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ValidationError::DuplicateEmail(user.email).into());
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %user.id, role_id = %user.role.id, "user created");

        let link = self.links().issue(&user);
        if let Err(e) = self
            .mailer()
            .send_access_link(&user.email, &user.name, &link)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "access link not delivered; removing user");
            if let Err(rollback) = self.db().delete(Collection::Users, &user.id).await {
                tracing::error!(user_id = %user.id, error = %rollback, "could not remove undelivered user");
            }
            return Err(e.into());
        }
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the user does not exist.
    pub async fn get_user(&self, id: &str) -> Result<User, RepoError> {
        self.fetch(id).await
    }

    /// Case-insensitive lookup by e-mail.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if no user has that e-mail.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.db()
            .find_one(&DocFilter::new().eq_ignore_case("$.email", email.trim()))
            .await?
            .ok_or_else(|| RepoError::not_found(EntityType::User, email))
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        self.fetch_all().await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_users_by_role(&self, role_id: &str) -> Result<Vec<User>, RepoError> {
        Ok(self
            .db()
            .find_many(&DocFilter::new().eq("$.role.id", role_id))
            .await?)
    }

    /// Apply a partial update. A new name is copied into the projects and
    /// reviews that embed the user.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound`, `RepoError::Validation`,
    /// `RepoError::Permission` for a role the actor may not assign, or
    /// `RepoError::Propagation`.
    pub async fn update_user(
        &self,
        actor: &ActorContext,
        id: &str,
        update: UserUpdate,
    ) -> Result<User, RepoError> {
        let current = self.get_user(id).await?;
        if update.is_empty() {
            return Ok(current);
        }
        if let Some(name) = &update.name {
            check_not_blank("name", name)?;
        }
        if let Some(email) = &update.email {
            check_not_blank("email", email)?;
            self.ensure_email_free(email.trim(), Some(id)).await?;
        }

        let mut patch = serde_json::to_value(&update)?;
        if let Some(role_id) = &update.role_id {
            let role = self.get_role_for(actor, role_id).await?;
            patch["role"] = serde_json::to_value(RoleSummary::from(&role))?;
        }

        match self.db().update_fields(Collection::Users, id, &patch).await {
            Ok(0) => return Err(RepoError::not_found(EntityType::User, id)),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(ValidationError::DuplicateEmail(
                    update.email.unwrap_or_default(),
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        }
        let user = self.get_user(id).await?;
        tracing::info!(user_id = id, "user updated");

        let mut steps = Vec::new();
        if user.name != current.name {
            steps.push(FanoutStep::SyncUserInProjects {
                user_id: user.id.clone(),
                name: user.name.clone(),
            });
            steps.push(FanoutStep::SyncUserInReviews {
                user_id: user.id.clone(),
                name: user.name.clone(),
            });
        }
        self.propagate(EntityType::User, id, steps).await?;
        Ok(user)
    }

    /// Soft delete.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the user does not exist.
    pub async fn deactivate_user(&self, id: &str) -> Result<(), RepoError> {
        if self
            .db()
            .deactivate(Collection::Users, id, Utc::now())
            .await?
            == 0
        {
            return Err(RepoError::not_found(EntityType::User, id));
        }
        tracing::info!(user_id = id, "user deactivated");
        Ok(())
    }

    /// Add a project to the user's favorites. Adding it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the user or the project does not exist.
    pub async fn favorite_project(&self, user_id: &str, project_id: &str) -> Result<User, RepoError> {
        self.get_user(user_id).await?;
        self.get_project(project_id).await?;
        self.db()
            .add_to_set_where(
                Collection::Users,
                "$.favorited_projects",
                &json!(project_id),
                &DocFilter::new().id(user_id),
            )
            .await?;
        self.get_user(user_id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the user does not exist.
    pub async fn unfavorite_project(&self, user_id: &str, project_id: &str) -> Result<User, RepoError> {
        self.get_user(user_id).await?;
        self.db()
            .pull_where(
                Collection::Users,
                "$.favorited_projects",
                &json!(project_id),
                &DocFilter::new().id(user_id),
            )
            .await?;
        self.get_user(user_id).await
    }

    async fn ensure_email_free(&self, email: &str, except: Option<&str>) -> Result<(), RepoError> {
        let mut filter = DocFilter::new().eq_ignore_case("$.email", email);
        if let Some(id) = except {
            filter = filter.id_not_in([id]);
        }
        if self.db().count(Collection::Users, &filter).await? > 0 {
            return Err(ValidationError::DuplicateEmail(email.to_string()).into());
        }
        Ok(())
    }
}

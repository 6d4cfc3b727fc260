//! Consistency propagation of embedded summaries.
//!
//! A mutation writes its primary document, then describes every copy that must
//! follow as an ordered list of [`FanoutStep`]s. [`ExpoService::propagate`]
//! runs them one by one; a failed step does not stop the rest, is queued in the
//! fan-out outbox, and is reported in a [`PropagationError`].
//!
//! Steps are idempotent: replaying one after it (or a later step) already ran
//! converges on the same documents.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use expo_core::entities::{
    Exhibition, Project, ProjectResume, RoleSummary, User, UserProjectResume, UserReviewResume,
};
use expo_core::enums::EntityType;

use crate::ExpoDb;
use crate::error::DatabaseError;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};

/// One idempotent write against embedded copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FanoutStep {
    /// Point each listed user's `project` at this summary.
    SetUserProject {
        user_ids: Vec<String>,
        project: UserProjectResume,
    },
    /// Unset `project` on users embedding `project_id`, except `keep_user_ids`.
    DetachUsersFromProject {
        project_id: String,
        keep_user_ids: Vec<String>,
    },
    RemoveFavoriteProject {
        project_id: String,
    },
    /// Add (or refresh) the project in the exhibition's list, and its first
    /// banner in the exhibition's banners. Fails if the exhibition is missing
    /// or deactivated.
    AddProjectToExhibition {
        exhibition_id: String,
        project: ProjectResume,
    },
    /// Refresh the project's entry in place, matched by embedded id.
    ReplaceProjectInExhibition {
        exhibition_id: String,
        project: ProjectResume,
    },
    RemoveProjectFromExhibition {
        exhibition_id: String,
        project_id: String,
    },
    RemoveExhibitionBanner {
        exhibition_id: String,
        banner: String,
    },
    DeactivateProjectReviews {
        project_id: String,
    },
    DeleteProjectDocument {
        project_id: String,
    },
    SyncRoleInUsers {
        role: RoleSummary,
    },
    SyncRoleInExhibitions {
        role_id: String,
        name: String,
    },
    SyncRoleInReviews {
        role_id: String,
        name: String,
    },
    /// Replace the user's review entry with the same review id (or the same
    /// project and exhibition), else append it.
    UpsertUserReview {
        user_id: String,
        review: UserReviewResume,
    },
    PullUserReview {
        user_id: String,
        project_id: String,
    },
    SyncUserInProjects {
        user_id: String,
        name: String,
    },
    SyncUserInReviews {
        user_id: String,
        name: String,
    },
    SyncExhibitionInReviews {
        exhibition_id: String,
        name: String,
    },
    SyncProjectInReviews {
        project_id: String,
        name: String,
    },
}

impl FanoutStep {
    /// Short operation name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetUserProject { .. } => "set_user_project",
            Self::DetachUsersFromProject { .. } => "detach_users_from_project",
            Self::RemoveFavoriteProject { .. } => "remove_favorite_project",
            Self::AddProjectToExhibition { .. } => "add_project_to_exhibition",
            Self::ReplaceProjectInExhibition { .. } => "replace_project_in_exhibition",
            Self::RemoveProjectFromExhibition { .. } => "remove_project_from_exhibition",
            Self::RemoveExhibitionBanner { .. } => "remove_exhibition_banner",
            Self::DeactivateProjectReviews { .. } => "deactivate_project_reviews",
            Self::DeleteProjectDocument { .. } => "delete_project_document",
            Self::SyncRoleInUsers { .. } => "sync_role_in_users",
            Self::SyncRoleInExhibitions { .. } => "sync_role_in_exhibitions",
            Self::SyncRoleInReviews { .. } => "sync_role_in_reviews",
            Self::UpsertUserReview { .. } => "upsert_user_review",
            Self::PullUserReview { .. } => "pull_user_review",
            Self::SyncUserInProjects { .. } => "sync_user_in_projects",
            Self::SyncUserInReviews { .. } => "sync_user_in_reviews",
            Self::SyncExhibitionInReviews { .. } => "sync_exhibition_in_reviews",
            Self::SyncProjectInReviews { .. } => "sync_project_in_reviews",
        }
    }
}

impl fmt::Display for FanoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A step that failed, and where it was queued for retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub step: FanoutStep,
    pub error: String,
    /// `None` if the outbox itself could not be written.
    pub outbox_id: Option<String>,
}

/// Some fan-out steps failed after the primary write committed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} fan-out step(s) failed after writing {entity} '{id}'", .failures.len())]
pub struct PropagationError {
    pub entity: EntityType,
    pub id: String,
    pub failures: Vec<StepFailure>,
}

impl ExpoDb {
    /// Execute one step. Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a write fails, or
    /// `DatabaseError::InvalidState` if a conditional add matched nothing.
    pub async fn apply_step(&self, step: &FanoutStep) -> Result<u64, DatabaseError> {
        match step {
            FanoutStep::SetUserProject { user_ids, project } => {
                self.set_path_where(
                    Collection::Users,
                    "$.project",
                    &serde_json::to_value(project)?,
                    &DocFilter::new().id_in(user_ids.iter().cloned()),
                )
                .await
            }
            FanoutStep::DetachUsersFromProject {
                project_id,
                keep_user_ids,
            } => {
                self.remove_path_where(
                    Collection::Users,
                    "$.project",
                    &DocFilter::new()
                        .eq("$.project.id", project_id.as_str())
                        .id_not_in(keep_user_ids.iter().cloned()),
                )
                .await
            }
            FanoutStep::RemoveFavoriteProject { project_id } => {
                self.pull_where(
                    Collection::Users,
                    "$.favorited_projects",
                    &json!(project_id),
                    &DocFilter::new().array_contains("$.favorited_projects", project_id.as_str()),
                )
                .await
            }
            FanoutStep::AddProjectToExhibition {
                exhibition_id,
                project,
            } => self.add_project_to_exhibition(exhibition_id, project).await,
            FanoutStep::ReplaceProjectInExhibition {
                exhibition_id,
                project,
            } => {
                self.modify_where::<Exhibition, _>(
                    &DocFilter::new()
                        .id(exhibition_id.as_str())
                        .any_element("$.projects", "$.id", project.id.as_str()),
                    |exhibition| {
                        for entry in exhibition.projects.iter_mut().filter(|p| p.id == project.id) {
                            entry.clone_from(project);
                        }
                        true
                    },
                )
                .await
            }
            FanoutStep::RemoveProjectFromExhibition {
                exhibition_id,
                project_id,
            } => {
                self.modify_where::<Exhibition, _>(
                    &DocFilter::new()
                        .id(exhibition_id.as_str())
                        .any_element("$.projects", "$.id", project_id.as_str()),
                    |exhibition| {
                        exhibition.projects.retain(|p| &p.id != project_id);
                        true
                    },
                )
                .await
            }
            FanoutStep::RemoveExhibitionBanner {
                exhibition_id,
                banner,
            } => {
                self.pull_where(
                    Collection::Exhibitions,
                    "$.banners",
                    &json!(banner),
                    &DocFilter::new().id(exhibition_id.as_str()),
                )
                .await
            }
            FanoutStep::DeactivateProjectReviews { project_id } => {
                self.set_path_where(
                    Collection::Reviews,
                    "$.active",
                    &json!(false),
                    &DocFilter::new().eq("$.project.id", project_id.as_str()),
                )
                .await
            }
            FanoutStep::DeleteProjectDocument { project_id } => {
                self.delete(Collection::Projects, project_id).await
            }
            FanoutStep::SyncRoleInUsers { role } => {
                self.set_path_where(
                    Collection::Users,
                    "$.role",
                    &serde_json::to_value(role)?,
                    &DocFilter::new().eq("$.role.id", role.id.as_str()),
                )
                .await
            }
            FanoutStep::SyncRoleInExhibitions { role_id, name } => {
                self.modify_where::<Exhibition, _>(
                    &DocFilter::new().any_element("$.roles", "$.id", role_id.as_str()),
                    |exhibition| {
                        let mut changed = false;
                        for entry in exhibition.roles.iter_mut().filter(|r| &r.id == role_id) {
                            if &entry.name != name {
                                entry.name.clone_from(name);
                                changed = true;
                            }
                        }
                        changed
                    },
                )
                .await
            }
            FanoutStep::SyncRoleInReviews { role_id, name } => {
                self.set_path_where(
                    Collection::Reviews,
                    "$.user.role.name",
                    &json!(name),
                    &DocFilter::new().eq("$.user.role.id", role_id.as_str()),
                )
                .await
            }
            FanoutStep::UpsertUserReview { user_id, review } => {
                self.modify_where::<User, _>(&DocFilter::new().id(user_id.as_str()), |user| {
                    let existing = user.reviews.iter_mut().find(|r| {
                        r.id == review.id
                            || (r.project_id == review.project_id
                                && r.exhibition_id == review.exhibition_id)
                    });
                    match existing {
                        Some(entry) => entry.clone_from(review),
                        None => user.reviews.push(review.clone()),
                    }
                    true
                })
                .await
            }
            FanoutStep::PullUserReview {
                user_id,
                project_id,
            } => {
                self.modify_where::<User, _>(&DocFilter::new().id(user_id.as_str()), |user| {
                    let before = user.reviews.len();
                    user.reviews.retain(|r| &r.project_id != project_id);
                    user.reviews.len() != before
                })
                .await
            }
            FanoutStep::SyncUserInProjects { user_id, name } => {
                self.modify_where::<Project, _>(
                    &DocFilter::new().any_element("$.expositors", "$.id", user_id.as_str()),
                    |project| {
                        for entry in project.expositors.iter_mut().filter(|e| &e.id == user_id) {
                            entry.name = Some(name.clone());
                        }
                        true
                    },
                )
                .await
            }
            FanoutStep::SyncUserInReviews { user_id, name } => {
                self.set_path_where(
                    Collection::Reviews,
                    "$.user.name",
                    &json!(name),
                    &DocFilter::new().eq("$.user.id", user_id.as_str()),
                )
                .await
            }
            FanoutStep::SyncExhibitionInReviews {
                exhibition_id,
                name,
            } => {
                self.set_path_where(
                    Collection::Reviews,
                    "$.exhibition.name",
                    &json!(name),
                    &DocFilter::new().eq("$.exhibition.id", exhibition_id.as_str()),
                )
                .await
            }
            FanoutStep::SyncProjectInReviews { project_id, name } => {
                self.set_path_where(
                    Collection::Reviews,
                    "$.project.name",
                    &json!(name),
                    &DocFilter::new().eq("$.project.id", project_id.as_str()),
                )
                .await
            }
        }
    }

    /// Add-to-set by embedded id, conditional on the exhibition being active.
    async fn add_project_to_exhibition(
        &self,
        exhibition_id: &str,
        project: &ProjectResume,
    ) -> Result<u64, DatabaseError> {
        let active = DocFilter::new().is_null("$.deactivation_date");
        let Some(mut exhibition) = self
            .find_one::<Exhibition>(&active.clone().id(exhibition_id))
            .await?
        else {
            return Err(DatabaseError::InvalidState(format!(
                "exhibition '{exhibition_id}' is missing or deactivated"
            )));
        };

        exhibition.projects.retain(|p| p.id != project.id);
        exhibition.projects.push(project.clone());
        if let Some(banner) = project.banners.first() {
            if !exhibition.banners.contains(banner) {
                exhibition.banners.push(banner.clone());
            }
        }

        let written = self.replace_if(&exhibition, &active).await?;
        if written == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "exhibition '{exhibition_id}' was deactivated before the project could be added"
            )));
        }
        Ok(written)
    }
}

impl ExpoService {
    /// Run `steps` in order after the primary write of `entity` `id`.
    ///
    /// Every step runs even if an earlier one failed. Failed steps are queued
    /// in the outbox for [`ExpoService::reconcile_outbox`].
    ///
    /// # Errors
    ///
    /// Returns `PropagationError` listing each failed step.
    pub async fn propagate(
        &self,
        entity: EntityType,
        id: &str,
        steps: Vec<FanoutStep>,
    ) -> Result<(), PropagationError> {
        let mut failures = Vec::new();
        for step in steps {
            match self.db().apply_step(&step).await {
                Ok(written) => {
                    tracing::debug!(%entity, id, step = step.name(), written, "fan-out step applied");
                }
                Err(e) => {
                    tracing::warn!(%entity, id, step = step.name(), error = %e, "fan-out step failed");
                    let error = e.to_string();
                    let outbox_id = match self.enqueue_step(entity, id, &step, &error).await {
                        Ok(outbox_id) => Some(outbox_id),
                        Err(oe) => {
                            tracing::error!(
                                %entity, id, step = step.name(), error = %oe,
                                "could not queue failed fan-out step; summaries stay stale"
                            );
                            None
                        }
                    };
                    failures.push(StepFailure {
                        step,
                        error,
                        outbox_id,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PropagationError {
                entity,
                id: id.to_string(),
                failures,
            })
        }
    }
}

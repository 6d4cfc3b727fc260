//! Review repository: graded reviews and the reviewer's copy of them.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use expo_core::entities::{Review, ReviewExhibition, ReviewProject, ReviewResume, UserReviewResume};
use expo_core::enums::{EntityType, Permission};
use expo_core::identity::ActorContext;
use expo_core::ids::{DEFAULT_ROLE_ID, PREFIX_REVIEW};
use expo_core::summaries::reviewer_resume;
use expo_core::validation::{
    ScoreInput, ValidationError, check_comment, grade_against_criteria,
};

use crate::error::RepoError;
use crate::propagation::FanoutStep;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};
use crate::updates::review::ReviewUpdate;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub exhibition_id: String,
    pub project_id: String,
    pub grades: Vec<ScoreInput>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub exhibition_id: Option<String>,
    pub project_id: Option<String>,
}

/// What a caller may see of a review list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "reviews", rename_all = "snake_case")]
pub enum ReviewView {
    /// Every matching review, for callers holding `read_review`.
    Full(Vec<Review>),
    /// Only the caller's own reviews, reduced to grades.
    Scoped(Vec<ReviewResume>),
}

impl ReviewView {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Full(reviews) => reviews.len(),
            Self::Scoped(reviews) => reviews.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpoService {
    /// Review a project on behalf of `actor`.
    ///
    /// The reviewer's weight is the actor's role entry in the exhibition, or
    /// the default role's entry when the actor's role is not listed.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the exhibition is missing or
    /// deactivated, or the project or reviewer does not exist;
    /// `RepoError::Validation` if the project belongs elsewhere, the grades do
    /// not match the criteria, or the comment is too long.
    pub async fn create_review(&self, actor: &ActorContext, input: NewReview) -> Result<Review, RepoError> {
        let exhibition = self.get_active_exhibition(&input.exhibition_id).await?;
        let project = self.get_project(&input.project_id).await?;
        if project.exhibition_id != exhibition.id {
            return Err(ValidationError::ProjectNotInExhibition {
                project_id: project.id,
                exhibition_id: exhibition.id,
            }
            .into());
        }
        check_comment(input.comment.as_deref())?;
        let grades = grade_against_criteria(&exhibition.criteria, &input.grades)?;
        let role_entry = exhibition
            .role_entry(&actor.role_id)
            .or_else(|| exhibition.role_entry(DEFAULT_ROLE_ID))
            .ok_or(ValidationError::MissingDefaultRole)?;
        let reviewer = self.get_user(&actor.user_id).await?;

        let review = Review {
            id: self.db().generate_id(PREFIX_REVIEW).await?,
            grades,
            project: ReviewProject::from(&project),
            exhibition: ReviewExhibition::from(&exhibition),
            user: reviewer_resume(&reviewer, role_entry),
            comment: input.comment,
            active: true,
            created_at: Utc::now(),
        };
        self.db().insert(&review).await?;
        tracing::info!(
            review_id = %review.id,
            project_id = %review.project.id,
            reviewer = %review.user.id,
            weight = review.user.role.weight,
            "review created"
        );

        let steps = vec![FanoutStep::UpsertUserReview {
            user_id: review.user.id.clone(),
            review: UserReviewResume::from(&review),
        }];
        self.propagate(EntityType::Review, &review.id, steps).await?;
        Ok(review)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the review does not exist.
    pub async fn get_review(&self, id: &str) -> Result<Review, RepoError> {
        self.fetch(id).await
    }

    /// Active reviews matching `filter`. Callers without `read_review` only
    /// see their own, as [`ReviewView::Scoped`].
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_reviews(
        &self,
        actor: &ActorContext,
        filter: &ReviewFilter,
    ) -> Result<ReviewView, RepoError> {
        let mut doc_filter = DocFilter::new().eq("$.active", true);
        if let Some(exhibition_id) = &filter.exhibition_id {
            doc_filter = doc_filter.eq("$.exhibition.id", exhibition_id.as_str());
        }
        if let Some(project_id) = &filter.project_id {
            doc_filter = doc_filter.eq("$.project.id", project_id.as_str());
        }

        if actor.can(Permission::ReadReview) {
            return Ok(ReviewView::Full(self.db().find_many(&doc_filter).await?));
        }
        let own: Vec<Review> = self
            .db()
            .find_many(&doc_filter.eq("$.user.id", actor.user_id.as_str()))
            .await?;
        Ok(ReviewView::Scoped(own.iter().map(ReviewResume::from).collect()))
    }

    /// Change grades or comment. Grades are re-checked against the
    /// exhibition's current criteria.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Permission` unless `actor` wrote the review or holds
    /// `update_review`; `RepoError::NotFound`, `RepoError::Validation`, or
    /// `RepoError::Propagation`.
    pub async fn update_review(
        &self,
        actor: &ActorContext,
        id: &str,
        update: ReviewUpdate,
    ) -> Result<Review, RepoError> {
        let mut review = self.get_review(id).await?;
        if review.user.id != actor.user_id && !actor.can(Permission::UpdateReview) {
            return Err(RepoError::Permission(format!(
                "'{}' may not edit review '{id}'",
                actor.user_id
            )));
        }

        let fields = update.fields();
        if let Some(comment) = update.comment {
            check_comment(comment.as_deref())?;
            review.comment = comment;
        }
        if let Some(scores) = &update.grades {
            let exhibition = self.get_exhibition(&review.exhibition.id).await?;
            review.grades = grade_against_criteria(&exhibition.criteria, scores)?;
        }

        if self.db().write_fields(&review, &fields).await? == 0 {
            return Err(RepoError::not_found(EntityType::Review, id));
        }
        tracing::info!(review_id = id, "review updated");

        let steps = vec![FanoutStep::UpsertUserReview {
            user_id: review.user.id.clone(),
            review: UserReviewResume::from(&review),
        }];
        self.propagate(EntityType::Review, id, steps).await?;
        Ok(review)
    }

    /// Delete a review and pull it from the reviewer's list.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the review does not exist,
    /// `RepoError::Propagation` if the reviewer's copy could not be removed.
    pub async fn delete_review(&self, id: &str) -> Result<(), RepoError> {
        let review = self.get_review(id).await?;
        self.db().delete(Collection::Reviews, id).await?;
        tracing::info!(review_id = id, "review deleted");

        let steps = vec![FanoutStep::PullUserReview {
            user_id: review.user.id,
            project_id: review.project.id,
        }];
        self.propagate(EntityType::Review, id, steps).await?;
        Ok(())
    }
}

//! Exhibition repository: weighted roles, criteria, lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use expo_core::entities::{CriteriaResume, Exhibition, ExhibitionSummary, RoleResume};
use expo_core::enums::EntityType;
use expo_core::ids::{DEFAULT_ROLE_ID, PREFIX_EXHIBITION};
use expo_core::summaries::role_resume;
use expo_core::validation::{check_date_order, check_not_blank};

use crate::error::RepoError;
use crate::external::Upload;
use crate::propagation::FanoutStep;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};
use crate::updates::exhibition::ExhibitionUpdate;

/// Criterion used when an exhibition is created without any.
pub const DEFAULT_CRITERION: &str = "Overall";

/// A role and the weight its reviews carry in one exhibition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleWeight {
    pub role_id: String,
    pub weight: f64,
}

impl RoleWeight {
    pub fn new(role_id: impl Into<String>, weight: f64) -> Self {
        Self {
            role_id: role_id.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExhibition {
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Defaults to the default role at weight 1.0.
    #[serde(default)]
    pub roles: Vec<RoleWeight>,
    /// Defaults to a single criterion at weight 1.0.
    #[serde(default)]
    pub criteria: Vec<CriteriaResume>,
}

#[derive(Debug, Clone, Default)]
pub struct ExhibitionFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Only exhibitions starting at or after this instant.
    pub start_from: Option<DateTime<Utc>>,
}

impl ExpoService {
    /// Create an exhibition.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Validation` if the dates are out of order, the
    /// role or criteria weights do not sum to 1.0, or the default role is
    /// missing; `RepoError::NotFound` if a listed role does not exist.
    pub async fn create_exhibition(&self, input: NewExhibition) -> Result<Exhibition, RepoError> {
        check_not_blank("name", &input.name)?;
        check_date_order(input.start_date, input.end_date)?;

        let weights = if input.roles.is_empty() {
            vec![RoleWeight::new(DEFAULT_ROLE_ID, 1.0)]
        } else {
            input.roles
        };
        let criteria = if input.criteria.is_empty() {
            vec![CriteriaResume {
                name: DEFAULT_CRITERION.to_string(),
                weight: 1.0,
            }]
        } else {
            input.criteria
        };
        let roles = self.resolve_role_weights(&weights).await?;
        self.rules().check_roles(&roles)?;
        self.rules().check_criteria(&criteria)?;

        let exhibition = Exhibition {
            id: self.db().generate_id(PREFIX_EXHIBITION).await?,
            name: input.name,
            description: input.description,
            image: None,
            start_date: input.start_date,
            end_date: input.end_date,
            deactivation_date: None,
            roles,
            criteria,
            projects: vec![],
            banners: vec![],
        };
        self.db().insert(&exhibition).await?;
        tracing::info!(exhibition_id = %exhibition.id, name = %exhibition.name, "exhibition created");
        Ok(exhibition)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the exhibition does not exist.
    pub async fn get_exhibition(&self, id: &str) -> Result<Exhibition, RepoError> {
        self.fetch(id).await
    }

    /// An exhibition that exists and has not been deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` otherwise.
    pub async fn get_active_exhibition(&self, id: &str) -> Result<Exhibition, RepoError> {
        self.db()
            .find_one(&DocFilter::new().id(id).is_null("$.deactivation_date"))
            .await?
            .ok_or_else(|| RepoError::not_found(EntityType::Exhibition, id))
    }

    /// Active exhibitions, earliest start first.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_exhibitions(
        &self,
        filter: &ExhibitionFilter,
    ) -> Result<Vec<ExhibitionSummary>, RepoError> {
        let mut doc_filter = DocFilter::new().is_null("$.deactivation_date");
        if let Some(name) = &filter.name {
            doc_filter = doc_filter.contains("$.name", name.as_str());
        }
        let mut exhibitions: Vec<Exhibition> = self.db().find_many(&doc_filter).await?;
        if let Some(from) = filter.start_from {
            exhibitions.retain(|e| e.start_date >= from);
        }
        exhibitions.sort_by_key(|e| e.start_date);
        Ok(exhibitions.iter().map(ExhibitionSummary::from).collect())
    }

    /// The exhibition running now, else the next one to start.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn current_exhibition(&self) -> Result<Option<Exhibition>, RepoError> {
        self.current_exhibition_at(Utc::now()).await
    }

    /// Same as [`Self::current_exhibition`], evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn current_exhibition_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Exhibition>, RepoError> {
        let mut active: Vec<Exhibition> = self
            .db()
            .find_many(&DocFilter::new().is_null("$.deactivation_date"))
            .await?;
        active.sort_by_key(|e| e.start_date);

        if let Some(pos) = active
            .iter()
            .position(|e| e.start_date <= now && now <= e.end_date)
        {
            return Ok(Some(active.swap_remove(pos)));
        }
        Ok(active.into_iter().find(|e| e.start_date > now))
    }

    /// Apply a partial update and re-validate the merged exhibition.
    /// A new name is copied into the reviews that embed it.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound`, `RepoError::Validation`, or
    /// `RepoError::Propagation`.
    pub async fn update_exhibition(
        &self,
        id: &str,
        update: ExhibitionUpdate,
    ) -> Result<Exhibition, RepoError> {
        let mut exhibition = self.get_exhibition(id).await?;
        let old_name = exhibition.name.clone();
        let fields = update.fields();

        if let Some(name) = update.name {
            check_not_blank("name", &name)?;
            exhibition.name = name;
        }
        if let Some(description) = update.description {
            exhibition.description = description;
        }
        if let Some(start) = update.start_date {
            exhibition.start_date = start;
        }
        if let Some(end) = update.end_date {
            exhibition.end_date = end;
        }
        if let Some(weights) = &update.roles {
            exhibition.roles = self.resolve_role_weights(weights).await?;
        }
        if let Some(criteria) = update.criteria {
            exhibition.criteria = criteria;
        }
        check_date_order(exhibition.start_date, exhibition.end_date)?;
        self.rules().check_roles(&exhibition.roles)?;
        self.rules().check_criteria(&exhibition.criteria)?;

        if self.db().write_fields(&exhibition, &fields).await? == 0 {
            return Err(RepoError::not_found(EntityType::Exhibition, id));
        }
        tracing::info!(exhibition_id = id, "exhibition updated");

        let mut steps = Vec::new();
        if exhibition.name != old_name {
            steps.push(FanoutStep::SyncExhibitionInReviews {
                exhibition_id: exhibition.id.clone(),
                name: exhibition.name.clone(),
            });
        }
        self.propagate(EntityType::Exhibition, id, steps).await?;
        Ok(exhibition)
    }

    /// Soft delete. Projects and reviews keep pointing at it.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the exhibition does not exist.
    pub async fn deactivate_exhibition(&self, id: &str) -> Result<(), RepoError> {
        if self
            .db()
            .deactivate(Collection::Exhibitions, id, Utc::now())
            .await?
            == 0
        {
            return Err(RepoError::not_found(EntityType::Exhibition, id));
        }
        tracing::info!(exhibition_id = id, "exhibition deactivated");
        Ok(())
    }

    /// Store a new cover image and drop the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` or `RepoError::Storage` if the upload
    /// fails. Failing to delete the old image is only logged.
    pub async fn upload_exhibition_image(
        &self,
        id: &str,
        upload: Upload,
    ) -> Result<Exhibition, RepoError> {
        let mut exhibition = self.get_exhibition(id).await?;
        let url = self.blobs().upload("exhibitions", upload).await?;
        self.db()
            .update_fields(Collection::Exhibitions, id, &json!({ "image": url }))
            .await?;
        if let Some(old) = exhibition.image.replace(url) {
            self.delete_blob_best_effort(&old).await;
        }
        Ok(exhibition)
    }

    async fn resolve_role_weights(&self, weights: &[RoleWeight]) -> Result<Vec<RoleResume>, RepoError> {
        let mut roles = Vec::with_capacity(weights.len());
        for w in weights {
            let role = self.get_role(&w.role_id).await?;
            roles.push(role_resume(&role, w.weight));
        }
        Ok(roles)
    }
}

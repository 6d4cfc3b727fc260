//! Project repository.
//!
//! A project is embedded in three places: its exhibition's `projects` list
//! (plus the first image in `banners`), each expositor's `project`, and the
//! `project` of every review about it.

use chrono::Utc;
use serde::Deserialize;

use expo_core::entities::{ExpositorResume, Project, ProjectResume, UserProjectResume};
use expo_core::enums::EntityType;
use expo_core::ids::PREFIX_PROJECT;
use expo_core::validation::check_not_blank;

use crate::error::RepoError;
use crate::external::Upload;
use crate::propagation::FanoutStep;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};
use crate::updates::project::ProjectUpdate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub company_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub coordinates: Option<i64>,
    pub exhibition_id: String,
    #[serde(default)]
    pub expositor_ids: Vec<String>,
    /// URLs of already-uploaded images.
    #[serde(default)]
    pub images: Vec<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub exhibition_id: Option<String>,
    /// Case-insensitive substring of the project name.
    pub name: Option<String>,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
}

impl ExpoService {
    /// Create a project and register it with its exhibition and expositors.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the exhibition is missing or
    /// deactivated, or an expositor does not exist; `RepoError::Propagation`
    /// if the project was stored but a summary could not be written.
    pub async fn create_project(&self, input: NewProject) -> Result<Project, RepoError> {
        check_not_blank("name", &input.name)?;
        let exhibition = self.get_active_exhibition(&input.exhibition_id).await?;
        let expositors = self.resolve_expositors(&input.expositor_ids).await?;

        let project = Project {
            id: self.db().generate_id(PREFIX_PROJECT).await?,
            name: input.name,
            company_name: input.company_name,
            description: input.description,
            coordinates: input.coordinates,
            exhibition_id: exhibition.id,
            expositors,
            images: input.images,
            logo: input.logo,
            deactivation_date: None,
        };
        self.db().insert(&project).await?;
        tracing::info!(project_id = %project.id, exhibition_id = %project.exhibition_id, "project created");

        let steps = vec![
            Self::expositor_step(&project),
            FanoutStep::AddProjectToExhibition {
                exhibition_id: project.exhibition_id.clone(),
                project: ProjectResume::from(&project),
            },
        ];
        self.propagate(EntityType::Project, &project.id, steps).await?;
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the project does not exist.
    pub async fn get_project(&self, id: &str) -> Result<Project, RepoError> {
        self.fetch(id).await
    }

    /// # Errors
    ///
    /// Returns `RepoError::Database` if the query fails.
    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, RepoError> {
        let mut doc_filter = DocFilter::new().is_null("$.deactivation_date");
        if let Some(exhibition_id) = &filter.exhibition_id {
            doc_filter = doc_filter.eq("$.exhibition_id", exhibition_id.as_str());
        }
        if let Some(name) = &filter.name {
            doc_filter = doc_filter.contains("$.name", name.as_str());
        }
        if let Some(company) = &filter.company {
            doc_filter = doc_filter.contains("$.company_name", company.as_str());
        }
        Ok(self.db().find_many(&doc_filter).await?)
    }

    /// A project that is not being deleted.
    async fn get_live_project(&self, id: &str) -> Result<Project, RepoError> {
        let project = self.get_project(id).await?;
        if project.deactivation_date.is_some() {
            return Err(RepoError::not_found(EntityType::Project, id));
        }
        Ok(project)
    }

    /// Apply a partial update, possibly moving the project to another
    /// exhibition, and refresh every embedded copy.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the project, the target exhibition or
    /// an expositor is missing; `RepoError::Propagation` if a copy could not
    /// be refreshed.
    pub async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project, RepoError> {
        let current = self.get_live_project(id).await?;
        let mut project = current.clone();
        update.apply_scalars(&mut project);
        check_not_blank("name", &project.name)?;

        let moved = project.exhibition_id != current.exhibition_id;
        if moved {
            self.get_active_exhibition(&project.exhibition_id).await?;
        }
        if let Some(ids) = &update.expositor_ids {
            project.expositors = self.resolve_expositors(ids).await?;
        }

        if self.db().write_fields(&project, &update.fields()).await? == 0 {
            return Err(RepoError::not_found(EntityType::Project, id));
        }
        tracing::info!(project_id = id, moved, "project updated");

        let resume = ProjectResume::from(&project);
        let mut steps = if moved {
            let mut steps = vec![FanoutStep::RemoveProjectFromExhibition {
                exhibition_id: current.exhibition_id.clone(),
                project_id: project.id.clone(),
            }];
            steps.extend(Self::banner_removal(&current.exhibition_id, current.images.first()));
            steps.push(FanoutStep::AddProjectToExhibition {
                exhibition_id: project.exhibition_id.clone(),
                project: resume,
            });
            steps
        } else {
            vec![FanoutStep::ReplaceProjectInExhibition {
                exhibition_id: project.exhibition_id.clone(),
                project: resume,
            }]
        };
        steps.push(Self::expositor_step(&project));
        steps.push(FanoutStep::DetachUsersFromProject {
            project_id: project.id.clone(),
            keep_user_ids: project.expositor_ids(),
        });
        if project.name != current.name {
            steps.push(FanoutStep::SyncProjectInReviews {
                project_id: project.id.clone(),
                name: project.name.clone(),
            });
        }
        self.propagate(EntityType::Project, id, steps).await?;
        Ok(project)
    }

    /// Delete a project and every reference to it. Its reviews are kept but
    /// marked inactive.
    ///
    /// The project is stamped deactivated first, so queued steps that would
    /// re-embed it are dropped on reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound` if the project does not exist,
    /// `RepoError::Propagation` if a step failed (the remaining steps still
    /// ran and the failures are queued for reconciliation).
    pub async fn delete_project(&self, id: &str) -> Result<(), RepoError> {
        let project = self.get_project(id).await?;
        if project.deactivation_date.is_none()
            && self
                .db()
                .deactivate(Collection::Projects, id, Utc::now())
                .await?
                == 0
        {
            return Err(RepoError::not_found(EntityType::Project, id));
        }
        tracing::info!(project_id = id, exhibition_id = %project.exhibition_id, "deleting project");

        let mut steps = vec![
            FanoutStep::DeactivateProjectReviews {
                project_id: project.id.clone(),
            },
            FanoutStep::DetachUsersFromProject {
                project_id: project.id.clone(),
                keep_user_ids: vec![],
            },
            FanoutStep::RemoveFavoriteProject {
                project_id: project.id.clone(),
            },
            FanoutStep::RemoveProjectFromExhibition {
                exhibition_id: project.exhibition_id.clone(),
                project_id: project.id.clone(),
            },
        ];
        steps.extend(Self::banner_removal(&project.exhibition_id, project.images.first()));
        steps.push(FanoutStep::DeleteProjectDocument {
            project_id: project.id.clone(),
        });
        self.propagate(EntityType::Project, id, steps).await?;
        Ok(())
    }

    /// Store a new logo, drop the old one, and refresh the copies.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound`, `RepoError::Storage`, or
    /// `RepoError::Propagation`.
    pub async fn upload_project_logo(&self, id: &str, upload: Upload) -> Result<Project, RepoError> {
        let mut project = self.get_live_project(id).await?;
        let url = self.blobs().upload("projects/logos", upload).await?;
        let old = project.logo.replace(url);
        self.db().write_fields(&project, &["logo"]).await?;
        if let Some(old) = old {
            self.delete_blob_best_effort(&old).await;
        }

        let steps = vec![
            FanoutStep::ReplaceProjectInExhibition {
                exhibition_id: project.exhibition_id.clone(),
                project: ProjectResume::from(&project),
            },
            Self::expositor_step(&project),
        ];
        self.propagate(EntityType::Project, id, steps).await?;
        Ok(project)
    }

    /// Replace the project's images. The first image becomes an exhibition
    /// banner in place of the previous first image.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::NotFound`, `RepoError::Storage`, or
    /// `RepoError::Propagation`.
    pub async fn upload_project_images(
        &self,
        id: &str,
        uploads: Vec<Upload>,
    ) -> Result<Project, RepoError> {
        let mut project = self.get_live_project(id).await?;
        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            urls.push(self.blobs().upload("projects/images", upload).await?);
        }
        let old = std::mem::replace(&mut project.images, urls);
        self.db().write_fields(&project, &["images"]).await?;
        for url in &old {
            self.delete_blob_best_effort(url).await;
        }

        let mut steps = Vec::new();
        if old.first() != project.images.first() {
            steps.extend(Self::banner_removal(&project.exhibition_id, old.first()));
        }
        steps.push(FanoutStep::AddProjectToExhibition {
            exhibition_id: project.exhibition_id.clone(),
            project: ProjectResume::from(&project),
        });
        self.propagate(EntityType::Project, id, steps).await?;
        Ok(project)
    }

    fn banner_removal(exhibition_id: &str, first_image: Option<&String>) -> Option<FanoutStep> {
        first_image.map(|banner| FanoutStep::RemoveExhibitionBanner {
            exhibition_id: exhibition_id.to_string(),
            banner: banner.clone(),
        })
    }

    fn expositor_step(project: &Project) -> FanoutStep {
        FanoutStep::SetUserProject {
            user_ids: project.expositor_ids(),
            project: UserProjectResume::from(project),
        }
    }

    async fn resolve_expositors(&self, ids: &[String]) -> Result<Vec<ExpositorResume>, RepoError> {
        let mut expositors: Vec<ExpositorResume> = Vec::with_capacity(ids.len());
        for id in ids {
            if expositors.iter().any(|e| &e.id == id) {
                continue;
            }
            let user = self.get_user(id).await?;
            expositors.push(ExpositorResume::from(&user));
        }
        Ok(expositors)
    }
}

//! Summary projections.
//!
//! Every embedded copy of an entity is built here and nowhere else. The
//! projections are pure: they borrow the source entity, never mutate it, and
//! carry optional fields through as `None` instead of failing.

use crate::entities::{
    Exhibition, ExhibitionSummary, ExpositorResume, Project, ProjectResume, Review,
    ReviewExhibition, ReviewProject, ReviewResume, ReviewerResume, ReviewerRole, Role, RoleResume,
    RoleSummary, User, UserProjectResume, UserReviewResume,
};

impl From<&Project> for ProjectResume {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            logo: project.logo.clone(),
            company_name: project.company_name.clone(),
            description: project.description.clone(),
            banners: project.images.clone(),
            coordinates: project.coordinates,
        }
    }
}

impl From<&Project> for UserProjectResume {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            logo: project.logo.clone(),
            company_name: project.company_name.clone(),
        }
    }
}

impl From<&Project> for ReviewProject {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
        }
    }
}

impl From<&User> for ExpositorResume {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: Some(user.name.clone()),
        }
    }
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.clone(),
            name: role.name.clone(),
            permissions: role.permissions.clone(),
        }
    }
}

impl From<&Exhibition> for ReviewExhibition {
    fn from(exhibition: &Exhibition) -> Self {
        Self {
            id: exhibition.id.clone(),
            name: exhibition.name.clone(),
        }
    }
}

impl From<&Exhibition> for ExhibitionSummary {
    fn from(exhibition: &Exhibition) -> Self {
        Self {
            id: exhibition.id.clone(),
            name: exhibition.name.clone(),
            image: exhibition.image.clone(),
            start_date: exhibition.start_date,
            end_date: exhibition.end_date,
        }
    }
}

impl From<&Review> for ReviewResume {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            grades: review.grades.clone(),
            project_id: review.project.id.clone(),
        }
    }
}

impl From<&Review> for UserReviewResume {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            project_id: review.project.id.clone(),
            exhibition_id: review.exhibition.id.clone(),
            comment: review.comment.clone(),
        }
    }
}

/// Role fragment for an exhibition's weighted role list.
#[must_use]
pub fn role_resume(role: &Role, weight: f64) -> RoleResume {
    RoleResume {
        id: role.id.clone(),
        name: role.name.clone(),
        weight,
    }
}

/// Reviewer snapshot using the role entry the reviewer is weighed by.
#[must_use]
pub fn reviewer_resume(user: &User, role: &RoleResume) -> ReviewerResume {
    ReviewerResume {
        id: user.id.clone(),
        name: user.name.clone(),
        role: ReviewerRole {
            id: role.id.clone(),
            name: role.name.clone(),
            weight: role.weight,
        },
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An exhibition: a dated event grouping projects, judged by weighted roles on
/// weighted criteria.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Exhibition {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub deactivation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<RoleResume>,
    #[serde(default)]
    pub criteria: Vec<CriteriaResume>,
    #[serde(default)]
    pub projects: Vec<ProjectResume>,
    #[serde(default)]
    pub banners: Vec<String>,
}

impl Exhibition {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deactivation_date.is_none()
    }

    /// The role entry with the given id, if the exhibition weighs that role.
    #[must_use]
    pub fn role_entry(&self, role_id: &str) -> Option<&RoleResume> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    /// Number of embedded project entries carrying `project_id`.
    #[must_use]
    pub fn project_count(&self, project_id: &str) -> usize {
        self.projects.iter().filter(|p| p.id == project_id).count()
    }
}

/// Role fragment embedded in an exhibition, carrying that role's vote weight.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoleResume {
    pub id: String,
    pub name: String,
    pub weight: f64,
}

/// A judging criterion and its weight.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CriteriaResume {
    pub name: String,
    pub weight: f64,
}

/// Project copy embedded in an exhibition's project list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectResume {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub company_name: Option<String>,
    pub description: String,
    #[serde(default)]
    pub banners: Vec<String>,
    pub coordinates: Option<i64>,
}

/// List view of an exhibition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExhibitionSummary {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

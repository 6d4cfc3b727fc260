use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A judge's scoring of one project at one exhibition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Review {
    pub id: String,
    pub grades: Vec<Grade>,
    pub project: ReviewProject,
    pub exhibition: ReviewExhibition,
    pub user: ReviewerResume,
    pub comment: Option<String>,
    /// Cleared when the reviewed project is deleted.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Score for one criterion. `weight` is copied from the exhibition criteria
/// when the review is written.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Grade {
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReviewProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReviewExhibition {
    pub id: String,
    pub name: String,
}

/// Reviewer snapshot, including the role weight in force at review time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReviewerResume {
    pub id: String,
    pub name: String,
    pub role: ReviewerRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReviewerRole {
    pub id: String,
    pub name: String,
    pub weight: f64,
}

/// Reduced review shown to callers without `read_review`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ReviewResume {
    pub id: String,
    pub grades: Vec<Grade>,
    pub project_id: String,
}

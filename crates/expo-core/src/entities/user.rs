use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::role::RoleSummary;

/// A registered user: visitor, expositor, or judge depending on role.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: RoleSummary,
    pub profile_picture: Option<String>,
    pub knowledge: Option<String>,
    pub age: Option<u32>,
    pub company: Option<String>,
    pub class_name: Option<String>,
    /// The one project this user exposes, if any.
    pub project: Option<UserProjectResume>,
    #[serde(default)]
    pub reviews: Vec<UserReviewResume>,
    #[serde(default)]
    pub favorited_projects: Vec<String>,
    pub deactivation_date: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deactivation_date.is_none()
    }
}

/// Project copy embedded in an expositor's user document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserProjectResume {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub company_name: Option<String>,
}

/// Review copy embedded in the reviewer's user document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserReviewResume {
    pub id: String,
    pub project_id: String,
    pub exhibition_id: String,
    pub comment: Option<String>,
}

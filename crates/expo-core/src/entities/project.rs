use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A project shown at an exhibition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub company_name: Option<String>,
    pub description: String,
    /// Stand position on the exhibition floor plan.
    pub coordinates: Option<i64>,
    pub exhibition_id: String,
    #[serde(default)]
    pub expositors: Vec<ExpositorResume>,
    #[serde(default)]
    pub images: Vec<String>,
    pub logo: Option<String>,
    pub deactivation_date: Option<DateTime<Utc>>,
}

impl Project {
    /// IDs of every expositor, in list order.
    #[must_use]
    pub fn expositor_ids(&self) -> Vec<String> {
        self.expositors.iter().map(|e| e.id.clone()).collect()
    }
}

/// User copy embedded in a project's expositor list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExpositorResume {
    pub id: String,
    pub name: Option<String>,
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named permission set. Exactly one role (id `default`) is the default.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role copy embedded in a user document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A company exhibiting projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub name: String,
}

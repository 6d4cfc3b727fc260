use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A school class that visitors can belong to (e.g. "3F Dev", 2025).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SchoolClass {
    pub id: String,
    pub name: String,
    pub year: String,
}

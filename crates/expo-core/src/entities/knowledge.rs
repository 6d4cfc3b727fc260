use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An answer to "how did you hear about the event".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Knowledge {
    pub id: String,
    pub name: String,
}

//! Outbound mail relay configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MailConfig {
    /// HTTP endpoint that accepts access-link messages as JSON.
    #[serde(default)]
    pub relay_url: String,

    /// From address placed on every message.
    #[serde(default)]
    pub sender: String,

    /// Base URL a new user's id is appended to when building the access link.
    #[serde(default)]
    pub access_link_base: String,
}

impl MailConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.relay_url.is_empty() && !self.sender.is_empty() && !self.access_link_base.is_empty()
    }
}

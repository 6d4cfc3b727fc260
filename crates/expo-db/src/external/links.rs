//! Access links sent to new users.

use expo_core::entities::User;

/// Builds the URL a newly created user follows to sign in.
pub trait AccessLinkIssuer: Send + Sync {
    fn issue(&self, user: &User) -> String;
}

/// Appends the user id to a fixed base URL.
pub struct StaticLinkIssuer {
    base: String,
}

impl StaticLinkIssuer {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }
}

impl AccessLinkIssuer for StaticLinkIssuer {
    fn issue(&self, user: &User) -> String {
        format!("{}/{}", self.base, user.id)
    }
}

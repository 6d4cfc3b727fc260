use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Permission;

/// The authenticated caller of a repository operation.
///
/// Produced by the (external) authentication layer from a verified token.
/// Contains only data fields; no token handling happens here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActorContext {
    pub user_id: String,
    pub role_id: String,
    pub role_name: String,
    /// Weight the caller's role carried when the token was issued.
    pub role_weight: f64,
    pub permissions: Vec<String>,
}

impl ActorContext {
    /// Whether the caller holds `permission`.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.iter().any(|p| p == permission.as_str())
    }

    /// Whether the caller holds every permission in `required`.
    #[must_use]
    pub fn holds_all(&self, required: &[String]) -> bool {
        required.iter().all(|r| self.permissions.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(perms: &[&str]) -> ActorContext {
        ActorContext {
            user_id: "usr-1".into(),
            role_id: "rol-1".into(),
            role_name: "judge".into(),
            role_weight: 0.5,
            permissions: perms.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    #[test]
    fn can_checks_membership() {
        let a = actor(&["read_review"]);
        assert!(a.can(Permission::ReadReview));
        assert!(!a.can(Permission::DeleteReview));
    }

    #[test]
    fn holds_all_requires_superset() {
        let a = actor(&["read_project", "create_review"]);
        assert!(a.holds_all(&["create_review".into()]));
        assert!(a.holds_all(&[]));
        assert!(!a.holds_all(&["create_review".into(), "delete_role".into()]));
    }
}

//! Entity types, permissions, and outbox statuses.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Every document collection managed by Expo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Role,
    Exhibition,
    Project,
    Review,
    Company,
    Class,
    Knowledge,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
            Self::Exhibition => "exhibition",
            Self::Project => "project",
            Self::Review => "review",
            Self::Company => "company",
            Self::Class => "class",
            Self::Knowledge => "knowledge",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Capabilities a role can grant.
///
/// Roles store permissions as plain strings; this enum is the catalogue those
/// strings are validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ReadExhibition,
    CreateExhibition,
    UpdateExhibition,
    DeleteExhibition,
    ReadProject,
    CreateProject,
    UpdateProject,
    DeleteProject,
    ReadRole,
    CreateRole,
    UpdateRole,
    DeleteRole,
    ReadUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ReadReview,
    CreateReview,
    UpdateReview,
    DeleteReview,
}

impl Permission {
    pub const ALL: &'static [Self] = &[
        Self::ReadExhibition,
        Self::CreateExhibition,
        Self::UpdateExhibition,
        Self::DeleteExhibition,
        Self::ReadProject,
        Self::CreateProject,
        Self::UpdateProject,
        Self::DeleteProject,
        Self::ReadRole,
        Self::CreateRole,
        Self::UpdateRole,
        Self::DeleteRole,
        Self::ReadUser,
        Self::CreateUser,
        Self::UpdateUser,
        Self::DeleteUser,
        Self::ReadReview,
        Self::CreateReview,
        Self::UpdateReview,
        Self::DeleteReview,
    ];

    /// Permissions granted to the default role and to roles created without any.
    pub const DEFAULTS: &'static [Self] =
        &[Self::ReadExhibition, Self::ReadProject, Self::CreateReview];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadExhibition => "read_exhibition",
            Self::CreateExhibition => "create_exhibition",
            Self::UpdateExhibition => "update_exhibition",
            Self::DeleteExhibition => "delete_exhibition",
            Self::ReadProject => "read_project",
            Self::CreateProject => "create_project",
            Self::UpdateProject => "update_project",
            Self::DeleteProject => "delete_project",
            Self::ReadRole => "read_role",
            Self::CreateRole => "create_role",
            Self::UpdateRole => "update_role",
            Self::DeleteRole => "delete_role",
            Self::ReadUser => "read_user",
            Self::CreateUser => "create_user",
            Self::UpdateUser => "update_user",
            Self::DeleteUser => "delete_user",
            Self::ReadReview => "read_review",
            Self::CreateReview => "create_review",
            Self::UpdateReview => "update_review",
            Self::DeleteReview => "delete_review",
        }
    }

    /// The default permission set as owned strings, ready to store on a role.
    #[must_use]
    pub fn default_strings() -> Vec<String> {
        Self::DEFAULTS.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown permission '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// OutboxStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a failed fan-out step waiting in the outbox.
///
/// ```text
/// pending → (reconciled, row removed)
///         → dead (attempts exhausted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Dead,
}

impl OutboxStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

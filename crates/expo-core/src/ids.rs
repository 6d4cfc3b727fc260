//! ID prefix constants.
//!
//! IDs are generated by the database as `<prefix>-<32 hex chars>`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_ROLE: &str = "rol";
pub const PREFIX_EXHIBITION: &str = "exh";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_REVIEW: &str = "rev";
pub const PREFIX_COMPANY: &str = "cmp";
pub const PREFIX_CLASS: &str = "cls";
pub const PREFIX_KNOWLEDGE: &str = "knw";
pub const PREFIX_OUTBOX: &str = "obx";

/// Fixed id of the role assigned when none is specified.
pub const DEFAULT_ROLE_ID: &str = "default";

/// Display name the default role is seeded with.
pub const DEFAULT_ROLE_NAME: &str = "guest";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_ROLE,
    PREFIX_EXHIBITION,
    PREFIX_PROJECT,
    PREFIX_REVIEW,
    PREFIX_COMPANY,
    PREFIX_CLASS,
    PREFIX_KNOWLEDGE,
    PREFIX_OUTBOX,
];

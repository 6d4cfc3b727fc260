//! Database migration runner and seed data.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use expo_core::entities::Role;
use expo_core::enums::Permission;
use expo_core::ids::{DEFAULT_ROLE_ID, DEFAULT_ROLE_NAME};

use crate::ExpoDb;
use crate::error::DatabaseError;

/// Eight document tables, their JSON expression indexes, and the fan-out outbox.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

impl ExpoDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }

    /// Insert the default role unless it already exists.
    pub(crate) async fn seed_default_role(&self) -> Result<(), DatabaseError> {
        let role = Role {
            id: DEFAULT_ROLE_ID.to_string(),
            name: DEFAULT_ROLE_NAME.to_string(),
            permissions: Permission::default_strings(),
        };
        let doc = serde_json::to_string(&role)?;
        let inserted = self
            .execute_with("INSERT OR IGNORE INTO roles (id, doc) VALUES (?1, ?2)", || {
                libsql::params![role.id.as_str(), doc.as_str()]
            })
            .await?;
        if inserted > 0 {
            tracing::info!(role = DEFAULT_ROLE_ID, "seeded default role");
        }
        Ok(())
    }
}

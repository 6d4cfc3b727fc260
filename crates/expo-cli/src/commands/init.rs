use serde::Serialize;

use expo_config::ExpoConfig;
use expo_db::service::ExpoService;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    database: String,
    default_role: String,
    roles: usize,
}

/// Handle `expo init`. Opening the service already migrated the schema and
/// seeded the default role; this reports the result.
pub async fn handle(service: &ExpoService, config: &ExpoConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let default_role = service.default_role().await?;
    let roles = service.list_roles().await?.len();
    tracing::info!(path = %config.database.path, roles, "database initialized");

    output(
        &InitResponse {
            database: config.database.path.clone(),
            default_role: default_role.name,
            roles,
        },
        flags.format,
    )
}

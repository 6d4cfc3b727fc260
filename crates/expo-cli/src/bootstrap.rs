use std::path::Path;

use anyhow::Context;

use expo_config::ExpoConfig;
use expo_db::ExpoDb;
use expo_db::external::Collaborators;
use expo_db::retry::RetryConfig;
use expo_db::service::ExpoService;

use crate::cli::GlobalFlags;

/// Load configuration (with `.env`) and apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<ExpoConfig> {
    let mut config = ExpoConfig::load_with_dotenv().context("failed to load expo configuration")?;
    if let Some(path) = &flags.database {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

/// Open the database and wrap it in a service for maintenance commands.
///
/// Maintenance only replays fan-out steps, which never reach blob storage or
/// mail, so in-memory collaborators stand in for the configured ones.
pub async fn open_service(config: &ExpoConfig) -> anyhow::Result<ExpoService> {
    if !config.database.is_in_memory() {
        if let Some(parent) = Path::new(&config.database.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }
    }

    let db = ExpoDb::open_local(&config.database.path)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
    let rules = config.validation.rules()?;

    tracing::debug!(path = %config.database.path, "database opened");
    Ok(ExpoService::from_db(db, Collaborators::in_memory("http://localhost"))
        .with_rules(rules)
        .with_outbox_retry(RetryConfig::from_outbox(&config.outbox)))
}

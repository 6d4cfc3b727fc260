//! # expo-config
//!
//! Layered configuration loading for Expo using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`EXPO_*` prefix, `__` as separator)
//! 2. Project-level `.expo/config.toml`
//! 3. User-level `~/.config/expo/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `EXPO_STORAGE__BUCKET` -> `storage.bucket`,
//! `EXPO_OUTBOX__MAX_ATTEMPTS` -> `outbox.max_attempts`, etc.
//!
//! ```no_run
//! use expo_config::ExpoConfig;
//!
//! let config = ExpoConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod database;
mod error;
mod general;
mod mail;
mod outbox;
mod storage;
mod validation;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use mail::MailConfig;
pub use outbox::OutboxConfig;
pub use storage::{StorageBackend, StorageConfig};
pub use validation::ValidationConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExpoConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub outbox: OutboxConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl ExpoConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading a `.env` file, if one is found.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so callers can layer extra providers (e.g. CLI flags) on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".expo/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("EXPO_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("expo").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` (at most three levels) looking for a
    /// `.env`, then falls back to the current directory. Missing files are fine.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = ExpoConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(!config.mail.is_configured());
        assert_eq!(config.outbox.max_attempts, 8);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: ExpoConfig = ExpoConfig::figment().extract()?;
            assert_eq!(config.general.default_limit, 20);
            assert!((config.validation.weight_tolerance - 1e-6).abs() < f64::EPSILON);
            Ok(())
        });
    }
}

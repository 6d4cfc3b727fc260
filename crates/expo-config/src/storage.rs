//! Blob storage configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which `object_store` backend serves uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Local,
    S3,
}

fn default_region() -> String {
    String::from("us-east-1")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the `local` backend.
    #[serde(default)]
    pub root: String,

    /// Bucket for the `s3` backend.
    #[serde(default)]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible services. Empty means AWS.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    /// Prefix joined with an object key to form the public URL of an upload.
    #[serde(default)]
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: String::new(),
            bucket: String::new(),
            region: default_region(),
            endpoint: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            public_base_url: String::new(),
        }
    }
}

impl StorageConfig {
    /// Check that the selected backend has what it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_base_url.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "storage.public_base_url".into(),
            });
        }
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Local if self.root.is_empty() => Err(ConfigError::InvalidValue {
                field: "storage.root".into(),
                reason: "required for the local backend".into(),
            }),
            StorageBackend::Local => Ok(()),
            StorageBackend::S3 if self.bucket.is_empty() => Err(ConfigError::InvalidValue {
                field: "storage.bucket".into(),
                reason: "required for the s3 backend".into(),
            }),
            StorageBackend::S3 => Ok(()),
        }
    }

    /// Whether explicit S3 credentials were supplied.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

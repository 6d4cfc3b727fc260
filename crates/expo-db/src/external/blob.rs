//! Blob storage for uploaded images.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use thiserror::Error;

use expo_config::{StorageBackend, StorageConfig};

#[derive(Debug, Error)]
pub enum BlobError {
    /// The URL does not point into this store.
    #[error("URL '{0}' does not belong to this blob store")]
    ForeignUrl(String),

    #[error("Blob store misconfigured: {0}")]
    Config(String),

    #[error("Could not generate object key: {0}")]
    Entropy(String),

    #[error(transparent)]
    Store(#[from] object_store::Error),
}

/// A file to store.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Stores uploads and hands back their public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `upload` under `folder` and return its public URL.
    async fn upload(&self, folder: &str, upload: Upload) -> Result<String, BlobError>;

    /// Delete the object behind a URL previously returned by `upload`.
    /// Deleting an object that is already gone succeeds.
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}

/// [`BlobStore`] over any `object_store` backend.
///
/// Objects are keyed `{folder}/{random hex}-{file name}`; the public URL is
/// the configured base URL joined with the key.
pub struct ObjectStoreBlobs {
    store: Arc<dyn ObjectStore>,
    public_base_url: String,
    attributes: bool,
}

impl ObjectStoreBlobs {
    pub fn new(store: Arc<dyn ObjectStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            attributes: true,
        }
    }

    pub fn in_memory(public_base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), public_base_url)
    }

    /// Build the backend selected in configuration.
    ///
    /// # Errors
    ///
    /// Returns `BlobError::Config` if the section is incomplete, or the
    /// backend's own error if it cannot be constructed.
    pub fn from_config(config: &StorageConfig) -> Result<Self, BlobError> {
        config
            .validate()
            .map_err(|e| BlobError::Config(e.to_string()))?;

        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory(config.public_base_url.clone())),
            StorageBackend::Local => {
                std::fs::create_dir_all(&config.root)
                    .map_err(|e| BlobError::Config(format!("storage.root: {e}")))?;
                let store = LocalFileSystem::new_with_prefix(&config.root)?;
                let mut blobs = Self::new(Arc::new(store), config.public_base_url.clone());
                // The local backend rejects object attributes.
                blobs.attributes = false;
                Ok(blobs)
            }
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket)
                    .with_region(&config.region);
                if !config.endpoint.is_empty() {
                    builder = builder.with_endpoint(&config.endpoint).with_allow_http(true);
                }
                if config.has_credentials() {
                    builder = builder
                        .with_access_key_id(&config.access_key_id)
                        .with_secret_access_key(&config.secret_access_key);
                }
                Ok(Self::new(Arc::new(builder.build()?), config.public_base_url.clone()))
            }
        }
    }

    fn object_key(folder: &str, file_name: &str) -> Result<String, BlobError> {
        let mut random = [0u8; 8];
        getrandom::fill(&mut random).map_err(|e| BlobError::Entropy(e.to_string()))?;
        let hex: String = random.iter().map(|b| format!("{b:02x}")).collect();
        let safe_name = file_name.replace(['/', '\\'], "_");
        Ok(format!("{}/{hex}-{safe_name}", folder.trim_matches('/')))
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Result<&'a str, BlobError> {
        url.strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BlobError::ForeignUrl(url.to_string()))
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobs {
    async fn upload(&self, folder: &str, upload: Upload) -> Result<String, BlobError> {
        let key = Self::object_key(folder, &upload.file_name)?;
        let path = Path::from(key.as_str());

        let mut attributes = Attributes::new();
        if self.attributes {
            if let Some(content_type) = upload.content_type {
                attributes.insert(Attribute::ContentType, content_type.into());
            }
        }
        self.store
            .put_opts(&path, PutPayload::from(upload.bytes), PutOptions::from(attributes))
            .await?;

        tracing::debug!(%path, "blob uploaded");
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let key = self.key_for_url(url)?;
        match self.store.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

//! Collaborators the repositories consume through narrow contracts.
//!
//! Each contract is an object-safe trait so `ExpoService` can hold
//! `Arc<dyn ...>` and tests can swap in doubles.

pub mod blob;
pub mod links;
pub mod mail;

use std::sync::Arc;

pub use blob::{BlobError, BlobStore, ObjectStoreBlobs, Upload};
pub use links::{AccessLinkIssuer, StaticLinkIssuer};
pub use mail::{HttpMailer, LogOnlyMailer, MailError, Mailer};

/// The injected collaborators of an `ExpoService`.
#[derive(Clone)]
pub struct Collaborators {
    pub blobs: Arc<dyn BlobStore>,
    pub mailer: Arc<dyn Mailer>,
    pub links: Arc<dyn AccessLinkIssuer>,
}

impl Collaborators {
    /// In-memory blobs, a mailer that only logs, and links under `base_url`.
    #[must_use]
    pub fn in_memory(base_url: &str) -> Self {
        Self {
            blobs: Arc::new(ObjectStoreBlobs::in_memory(format!("{base_url}/files"))),
            mailer: Arc::new(LogOnlyMailer),
            links: Arc::new(StaticLinkIssuer::new(format!("{base_url}/access"))),
        }
    }
}

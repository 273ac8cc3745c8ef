//! The Media Host seam.

use async_trait::async_trait;
use creativestalk_core::media::HostedAssetKey;
use serde::{Deserialize, Serialize};

use crate::error::MediaHostError;

/// A file to push to the Media Host.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl MediaUpload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the Media Host returns for a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    /// Durable https URL of the asset.
    pub secure_url: String,
    /// Preview image generated by the host, when it made one.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub public_id: String,
    pub resource_type: String,
}

/// Result of an asset delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    /// The host had no such asset.
    NotFound,
}

/// Trait implemented by every Media Host backend (Cloudinary, in-memory).
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaHostError>;

    async fn destroy(&self, key: &HostedAssetKey) -> Result<DestroyOutcome, MediaHostError>;
}

//! [`PortfolioAccess`]: list, add, update, remove and bulk-remove portfolio
//! records, plus media uploads.
//!
//! | Operation      | Store unconfigured        | Transport failure      |
//! |----------------|---------------------------|------------------------|
//! | `list`         | empty                     | empty                  |
//! | `add`          | `Err(StoreUnavailable)`   | `Err(Store)`           |
//! | `update`       | `false`                   | `false`                |
//! | `remove`       | `false`                   | `false`                |
//! | `bulk_remove`  | every id in `failed`      | failing ids in `failed`|
//! | `upload_media` | n/a (`MediaUnavailable`)  | `Err(Media)`           |

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use creativestalk_core::media::{validate_upload_size, HostedAssetKey};
use creativestalk_core::portfolio::{NewPortfolioItem, PortfolioRecord, RecordPatch};
use creativestalk_core::types::RecordId;
use serde::Serialize;

use crate::cloudinary::HttpMediaHost;
use crate::config::{AccessConfig, MediaHostConfig, StoreConfig};
use crate::deletion::{Deletion, DeletionOutcome};
use crate::error::AccessError;
use crate::media_host::{MediaHost, MediaUpload, UploadedAsset};
use crate::postgrest::HttpRecordStore;
use crate::record_store::RecordStore;

/// Partition of a bulk delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkRemoval {
    pub succeeded: Vec<RecordId>,
    pub failed: Vec<RecordId>,
}

/// The only way the rest of the system reaches the Record Store and the
/// Media Host.
pub struct PortfolioAccess {
    store: Option<Arc<dyn RecordStore>>,
    media: Option<Arc<dyn MediaHost>>,
    config: AccessConfig,
    unconfigured_reason: String,
}

impl PortfolioAccess {
    pub fn new(
        store: Option<Arc<dyn RecordStore>>,
        media: Option<Arc<dyn MediaHost>>,
        config: AccessConfig,
    ) -> Self {
        Self {
            store,
            media,
            config,
            unconfigured_reason: "Record Store is not configured".to_string(),
        }
    }

    /// Access layer with no backends; every store operation degrades.
    pub fn unconfigured() -> Self {
        Self::new(None, None, AccessConfig::default())
    }

    /// Build the HTTP backends from environment variables.
    ///
    /// Missing or malformed settings leave the corresponding backend
    /// unconfigured; they are logged once here rather than on every call.
    pub fn from_env() -> Self {
        let config = AccessConfig::from_env();

        let (store, reason): (Option<Arc<dyn RecordStore>>, Option<String>) =
            match StoreConfig::from_env() {
                Ok(store_config) => match HttpRecordStore::new(store_config) {
                    Ok(store) => (Some(Arc::new(store)), None),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to build Record Store client");
                        (None, Some(e.to_string()))
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Record Store not configured, running without persistence");
                    (None, Some(e.to_string()))
                }
            };

        let media: Option<Arc<dyn MediaHost>> = match MediaHostConfig::from_env() {
            Ok(media_config) => match HttpMediaHost::new(media_config) {
                Ok(host) => Some(Arc::new(host)),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build Media Host client");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Media Host not configured, file uploads disabled");
                None
            }
        };

        let mut access = Self::new(store, media, config);
        if let Some(reason) = reason {
            access.unconfigured_reason = reason;
        }
        access
    }

    pub fn is_store_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_media_configured(&self) -> bool {
        self.media.is_some()
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// The single configured-store guard.
    fn store(&self) -> Result<&dyn RecordStore, AccessError> {
        self.store
            .as_deref()
            .ok_or_else(|| AccessError::StoreUnavailable(self.unconfigured_reason.clone()))
    }

    // ---- reads ----

    /// All records, newest first. Empty when the store is unconfigured or
    /// unreachable.
    pub async fn list(&self) -> Vec<PortfolioRecord> {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "Listing portfolio without a Record Store");
                return Vec::new();
            }
        };
        match store.select_all_ordered().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list portfolio records");
                Vec::new()
            }
        }
    }

    /// One record by id. `None` when absent, unconfigured or unreachable.
    pub async fn get(&self, id: &str) -> Option<PortfolioRecord> {
        let store = self.store().ok()?;
        match store.select_by_id(id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "Failed to fetch portfolio record");
                None
            }
        }
    }

    // ---- writes ----

    /// Validate and persist a new record, returning it as stored.
    pub async fn add(&self, candidate: NewPortfolioItem) -> Result<PortfolioRecord, AccessError> {
        let store = self.store()?;
        let candidate = candidate.normalized();
        candidate.validate_candidate()?;

        let record = store.insert(&candidate).await.map_err(|e| {
            tracing::error!(title = %candidate.title, error = %e, "Failed to insert portfolio record");
            AccessError::Store(e)
        })?;
        tracing::info!(record_id = %record.id, category = %record.category, "Portfolio record added");
        Ok(record)
    }

    /// Apply an edit. `false` on unconfigured store, invalid patch, unknown
    /// id or transport failure.
    pub async fn update(&self, id: &str, patch: &RecordPatch) -> bool {
        match self.try_update(id, patch).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "Portfolio update failed");
                false
            }
        }
    }

    /// Like [`update`](Self::update) but keeps the reason for a failure.
    /// `Ok(false)` means no record has this id.
    pub async fn try_update(&self, id: &str, patch: &RecordPatch) -> Result<bool, AccessError> {
        let store = self.store()?;
        patch.validate_patch()?;
        let updated = store.update(id, patch, Utc::now()).await?;
        if updated {
            tracing::info!(record_id = %id, "Portfolio record updated");
        }
        Ok(updated)
    }

    /// Delete a record and confirm it is gone.
    pub async fn remove(&self, id: &str) -> bool {
        self.remove_detailed(id).await.is_success()
    }

    pub async fn remove_detailed(&self, id: &str) -> DeletionOutcome {
        let store = match self.store() {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(record_id = %id, error = %e, "Cannot delete without a Record Store");
                return DeletionOutcome::StoreUnconfigured;
            }
        };

        let outcome = Deletion {
            store,
            media: self.media.as_deref(),
            id,
            max_attempts: self.config.max_delete_attempts,
        }
        .run()
        .await;

        tracing::info!(record_id = %id, ?outcome, "Portfolio delete finished");
        outcome
    }

    /// Remove each id in turn, pausing between items. Never stops early.
    ///
    /// Duplicate ids are processed once.
    pub async fn bulk_remove(&self, ids: &[RecordId]) -> BulkRemoval {
        let mut seen = HashSet::new();
        let unique: Vec<&RecordId> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();

        let mut result = BulkRemoval::default();
        for (index, id) in unique.iter().enumerate() {
            if index > 0 && !self.config.bulk_delay.is_zero() {
                tokio::time::sleep(self.config.bulk_delay).await;
            }
            if self.remove(id).await {
                result.succeeded.push((*id).clone());
            } else {
                result.failed.push((*id).clone());
            }
        }

        tracing::info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Bulk delete finished",
        );
        result
    }

    // ---- media ----

    /// Push a file to the Media Host.
    pub async fn upload_media(&self, upload: MediaUpload) -> Result<UploadedAsset, AccessError> {
        let media = self
            .media
            .as_deref()
            .ok_or_else(|| AccessError::MediaUnavailable("Media Host is not configured".into()))?;
        validate_upload_size(upload.size())?;

        let filename = upload.filename.clone();
        let asset = media.upload(upload).await?;
        tracing::info!(
            filename = %filename,
            public_id = %asset.public_id,
            resource_type = %asset.resource_type,
            "Media uploaded",
        );
        Ok(asset)
    }

    /// Best-effort removal of an uploaded asset whose record was never
    /// written. Failures are logged and swallowed.
    pub async fn discard_media(&self, asset: &UploadedAsset) {
        let Some(media) = self.media.as_deref() else {
            return;
        };
        let Some(key) = HostedAssetKey::from_url(&asset.secure_url) else {
            tracing::warn!(public_id = %asset.public_id, "Could not extract media asset key, upload left in place");
            return;
        };
        match media.destroy(&key).await {
            Ok(outcome) => {
                tracing::info!(public_id = %key.public_id, ?outcome, "Discarded orphaned upload");
            }
            Err(e) => {
                tracing::warn!(public_id = %key.public_id, error = %e, "Failed to discard orphaned upload");
            }
        }
    }
}

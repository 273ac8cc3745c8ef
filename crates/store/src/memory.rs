//! In-process Record Store and Media Host.
//!
//! Both keep their state behind a `tokio::sync::Mutex` and accept scripted
//! faults, so deletion and verification paths can be exercised without a
//! network. A store whose deletes "succeed" without removing anything is the
//! case verify-after-write exists for.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use creativestalk_core::media::HostedAssetKey;
use creativestalk_core::portfolio::{NewPortfolioItem, PortfolioRecord, RecordPatch};
use creativestalk_core::types::Timestamp;
use tokio::sync::Mutex;

use crate::error::{MediaHostError, StoreError};
use crate::media_host::{DestroyOutcome, MediaHost, MediaUpload, UploadedAsset};
use crate::record_store::RecordStore;

/// How one delete call (primary or procedure) behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteBehavior {
    /// Remove the row and report success.
    #[default]
    Apply,
    /// Report a transport failure.
    Fail,
    /// Report success without removing anything.
    SilentNoop,
}

/// How one lookup-by-id call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupBehavior {
    #[default]
    Answer,
    Fail,
}

/// Number of calls each entry point has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub procedure: usize,
    pub lookup: usize,
}

// ---------------------------------------------------------------------------
// InMemoryRecordStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    rows: Vec<PortfolioRecord>,
    next_id: u64,
    last_created: Option<Timestamp>,
    fail_list: bool,
    fail_insert: bool,
    fail_update: bool,
    delete_script: VecDeque<DeleteBehavior>,
    delete_default: DeleteBehavior,
    procedure_script: VecDeque<DeleteBehavior>,
    lookup_script: VecDeque<LookupBehavior>,
    lookup_default: LookupBehavior,
    calls: CallCounts,
}

impl StoreState {
    fn remove_row(&mut self, id: &str) {
        self.rows.retain(|r| r.id != id);
    }

    /// Strictly increasing creation stamps keep newest-first order stable.
    fn next_created_at(&mut self) -> Timestamp {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Record Store kept in process memory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<StoreState>,
    procedure: bool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows as they would come back from the store.
    pub fn with_records(records: Vec<PortfolioRecord>) -> Self {
        let last_created = records.iter().map(|r| r.created_at).max();
        Self {
            state: Mutex::new(StoreState {
                rows: records,
                last_created,
                ..Default::default()
            }),
            procedure: false,
        }
    }

    /// Advertise the alternate deletion procedure.
    pub fn with_delete_procedure(mut self) -> Self {
        self.procedure = true;
        self
    }

    pub async fn fail_list(&self, fail: bool) {
        self.state.lock().await.fail_list = fail;
    }

    pub async fn fail_insert(&self, fail: bool) {
        self.state.lock().await.fail_insert = fail;
    }

    pub async fn fail_update(&self, fail: bool) {
        self.state.lock().await.fail_update = fail;
    }

    /// Behaviour for primary deletes once the script runs out.
    pub async fn set_delete_default(&self, behavior: DeleteBehavior) {
        self.state.lock().await.delete_default = behavior;
    }

    /// Queue behaviours for the next primary deletes.
    pub async fn script_deletes(&self, behaviors: impl IntoIterator<Item = DeleteBehavior>) {
        self.state.lock().await.delete_script.extend(behaviors);
    }

    /// Queue behaviours for the next procedure deletes.
    pub async fn script_procedure(&self, behaviors: impl IntoIterator<Item = DeleteBehavior>) {
        self.state.lock().await.procedure_script.extend(behaviors);
    }

    pub async fn set_lookup_default(&self, behavior: LookupBehavior) {
        self.state.lock().await.lookup_default = behavior;
    }

    /// Queue behaviours for the next lookups-by-id.
    pub async fn script_lookups(&self, behaviors: impl IntoIterator<Item = LookupBehavior>) {
        self.state.lock().await.lookup_script.extend(behaviors);
    }

    /// Current rows, bypassing faults and call counters.
    pub async fn snapshot(&self) -> Vec<PortfolioRecord> {
        self.state.lock().await.rows.clone()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.lock().await.rows.iter().any(|r| r.id == id)
    }

    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {op} failure"))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select_all_ordered(&self) -> Result<Vec<PortfolioRecord>, StoreError> {
        let mut state = self.state.lock().await;
        state.calls.list += 1;
        if state.fail_list {
            return Err(injected("list"));
        }
        let mut rows = state.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, item: &NewPortfolioItem) -> Result<PortfolioRecord, StoreError> {
        let mut state = self.state.lock().await;
        state.calls.insert += 1;
        if state.fail_insert {
            return Err(injected("insert"));
        }
        state.next_id += 1;
        let created_at = state.next_created_at();
        let record = PortfolioRecord {
            id: format!("mem-{}", state.next_id),
            title: item.title.clone(),
            category: item.category.clone(),
            description: item.description.clone(),
            media: item.media.clone(),
            thumbnail: item.thumbnail.clone(),
            views: item.views.clone(),
            created_at,
            updated_at: created_at,
        };
        state.rows.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &str,
        patch: &RecordPatch,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        state.calls.update += 1;
        if state.fail_update {
            return Err(injected("update"));
        }
        match state.rows.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                patch.apply_to(record, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.calls.delete += 1;
        let behavior = state
            .delete_script
            .pop_front()
            .unwrap_or(state.delete_default);
        match behavior {
            DeleteBehavior::Apply => {
                state.remove_row(id);
                Ok(())
            }
            DeleteBehavior::Fail => Err(injected("delete")),
            DeleteBehavior::SilentNoop => Ok(()),
        }
    }

    async fn select_by_id(&self, id: &str) -> Result<Option<PortfolioRecord>, StoreError> {
        let mut state = self.state.lock().await;
        state.calls.lookup += 1;
        let behavior = state
            .lookup_script
            .pop_front()
            .unwrap_or(state.lookup_default);
        match behavior {
            LookupBehavior::Answer => Ok(state.rows.iter().find(|r| r.id == id).cloned()),
            LookupBehavior::Fail => Err(injected("lookup")),
        }
    }

    fn supports_delete_procedure(&self) -> bool {
        self.procedure
    }

    async fn delete_via_procedure(&self, id: &str) -> Result<(), StoreError> {
        if !self.procedure {
            return Err(StoreError::Unsupported("delete procedure"));
        }
        let mut state = self.state.lock().await;
        state.calls.procedure += 1;
        match state.procedure_script.pop_front().unwrap_or_default() {
            DeleteBehavior::Apply => {
                state.remove_row(id);
                Ok(())
            }
            DeleteBehavior::Fail => Err(injected("procedure")),
            DeleteBehavior::SilentNoop => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryMediaHost
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MediaState {
    /// Stored assets keyed by `(resource_type, public_id)`.
    assets: HashMap<(String, String), String>,
    uploads: u64,
    fail_uploads: bool,
    fail_destroys: bool,
    destroyed: Vec<HostedAssetKey>,
}

/// Media Host kept in process memory. URLs follow the Cloudinary delivery
/// shape so [`HostedAssetKey::from_url`] can parse them back.
pub struct InMemoryMediaHost {
    cloud_name: String,
    state: Mutex<MediaState>,
}

impl Default for InMemoryMediaHost {
    fn default() -> Self {
        Self::new("demo")
    }
}

impl InMemoryMediaHost {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            state: Mutex::new(MediaState::default()),
        }
    }

    /// Register an asset that already exists at `url`. Returns `false` when
    /// the URL is not a delivery URL.
    pub async fn register(&self, url: &str) -> bool {
        match HostedAssetKey::from_url(url) {
            Some(key) => {
                self.state
                    .lock()
                    .await
                    .assets
                    .insert((key.resource_type, key.public_id), url.to_string());
                true
            }
            None => false,
        }
    }

    pub async fn fail_uploads(&self, fail: bool) {
        self.state.lock().await.fail_uploads = fail;
    }

    pub async fn fail_destroys(&self, fail: bool) {
        self.state.lock().await.fail_destroys = fail;
    }

    pub async fn asset_count(&self) -> usize {
        self.state.lock().await.assets.len()
    }

    /// Keys passed to every successful `destroy` call, in order.
    pub async fn destroyed(&self) -> Vec<HostedAssetKey> {
        self.state.lock().await.destroyed.clone()
    }
}

fn resource_type_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(ct) if ct.starts_with("video/") || ct.starts_with("audio/") => "video",
        Some(ct) if ct.starts_with("image/") => "image",
        _ => "raw",
    }
}

#[async_trait]
impl MediaHost for InMemoryMediaHost {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaHostError> {
        let mut state = self.state.lock().await;
        if state.fail_uploads {
            return Err(MediaHostError::Unavailable("injected upload failure".into()));
        }
        state.uploads += 1;

        let path = Path::new(&upload.filename);
        let stem: String = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("asset")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("bin");
        let resource_type = resource_type_for(upload.content_type.as_deref());
        let public_id = format!("{stem}_{}", state.uploads);

        let base = format!(
            "https://res.cloudinary.com/{}/{resource_type}/upload/v{}",
            self.cloud_name, state.uploads
        );
        let secure_url = format!("{base}/{public_id}.{extension}");
        let thumbnail_url =
            (resource_type != "raw").then(|| format!("{base}/{public_id}.jpg"));

        state.assets.insert(
            (resource_type.to_string(), public_id.clone()),
            secure_url.clone(),
        );
        Ok(UploadedAsset {
            secure_url,
            thumbnail_url,
            public_id,
            resource_type: resource_type.to_string(),
        })
    }

    async fn destroy(&self, key: &HostedAssetKey) -> Result<DestroyOutcome, MediaHostError> {
        let mut state = self.state.lock().await;
        if state.fail_destroys {
            return Err(MediaHostError::Unavailable("injected destroy failure".into()));
        }
        let removed = state
            .assets
            .remove(&(key.resource_type.clone(), key.public_id.clone()));
        match removed {
            Some(_) => {
                state.destroyed.push(key.clone());
                Ok(DestroyOutcome::Deleted)
            }
            None => Ok(DestroyOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use creativestalk_core::portfolio::MediaReference;

    use super::*;

    fn item(title: &str) -> NewPortfolioItem {
        NewPortfolioItem::new(
            title,
            "videos",
            MediaReference::Link("https://youtu.be/abc".into()),
            "https://img/abc.jpg",
        )
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryRecordStore::new();
        let first = store.insert(&item("First")).await.unwrap();
        let second = store.insert(&item("Second")).await.unwrap();

        let rows = store.select_all_ordered().await.unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);
        assert!(rows[0].created_at > rows[1].created_at);
    }

    #[tokio::test]
    async fn scripted_deletes_run_in_order_then_fall_back_to_default() {
        let store = InMemoryRecordStore::new();
        let record = store.insert(&item("Reel")).await.unwrap();
        store
            .script_deletes([DeleteBehavior::Fail, DeleteBehavior::SilentNoop])
            .await;

        assert_matches!(store.delete(&record.id).await, Err(StoreError::Unavailable(_)));
        assert!(store.delete(&record.id).await.is_ok());
        assert!(store.contains(&record.id).await, "silent no-op leaves the row");
        assert!(store.delete(&record.id).await.is_ok());
        assert!(!store.contains(&record.id).await);
        assert_eq!(store.calls().await.delete, 3);
    }

    #[tokio::test]
    async fn procedure_is_unsupported_unless_advertised() {
        let store = InMemoryRecordStore::new();
        assert!(!store.supports_delete_procedure());
        assert_matches!(
            store.delete_via_procedure("x").await,
            Err(StoreError::Unsupported(_))
        );
    }

    #[tokio::test]
    async fn update_reports_missing_rows() {
        let store = InMemoryRecordStore::new();
        let patch = RecordPatch {
            title: Some("New".into()),
            ..Default::default()
        };
        assert!(!store.update("nope", &patch, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn uploaded_assets_can_be_destroyed_by_parsed_key() {
        let host = InMemoryMediaHost::new("studio");
        let asset = host
            .upload(MediaUpload::new(vec![1, 2, 3], "wedding cut.mp4").with_content_type("video/mp4"))
            .await
            .unwrap();
        assert_eq!(asset.resource_type, "video");
        assert!(asset.thumbnail_url.is_some());

        let key = HostedAssetKey::from_url(&asset.secure_url).expect("delivery URL parses");
        assert_eq!(key.public_id, asset.public_id);
        assert_eq!(host.destroy(&key).await.unwrap(), DestroyOutcome::Deleted);
        assert_eq!(host.destroy(&key).await.unwrap(), DestroyOutcome::NotFound);
        assert_eq!(host.asset_count().await, 0);
    }
}

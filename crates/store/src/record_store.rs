//! The Record Store seam.
//!
//! A record store is a remote table of portfolio rows. Every method maps to a
//! single request; retry and verification policy live in
//! [`deletion`](crate::deletion), not here.

use async_trait::async_trait;
use creativestalk_core::portfolio::{NewPortfolioItem, PortfolioRecord, RecordPatch};
use creativestalk_core::types::Timestamp;

use crate::error::StoreError;

/// Trait implemented by every Record Store backend (PostgREST, in-memory).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, newest first by creation time.
    async fn select_all_ordered(&self) -> Result<Vec<PortfolioRecord>, StoreError>;

    /// Insert one record and return it as stored.
    async fn insert(&self, item: &NewPortfolioItem) -> Result<PortfolioRecord, StoreError>;

    /// Apply `patch` and stamp `updated_at = now`. Returns `false` when no
    /// row has this id.
    async fn update(
        &self,
        id: &str,
        patch: &RecordPatch,
        now: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Primary delete-by-id. Success says nothing about whether a row was
    /// actually removed; callers verify with [`select_by_id`](Self::select_by_id).
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn select_by_id(&self, id: &str) -> Result<Option<PortfolioRecord>, StoreError>;

    /// Whether an alternate deletion entry point is available.
    fn supports_delete_procedure(&self) -> bool {
        false
    }

    /// Alternate deletion entry point (a stored procedure on hosted stores).
    async fn delete_via_procedure(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("delete procedure"))
    }
}

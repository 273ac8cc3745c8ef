//! Delete-then-verify state machine behind `remove`.
//!
//! ```text
//! Fetching ─► Resolved(found | not_found) ─► [MediaCleanup] ─► RecordDelete(1..N) ─► Verify ─► Done
//! ```
//!
//! Every path ends in [`DeletionState::Done`]; only [`DeletionOutcome::Deleted`]
//! and [`DeletionOutcome::AlreadyAbsent`] count as success, and `Deleted` is
//! only reached after a fresh lookup shows the row is gone.

use creativestalk_core::media::HostedAssetKey;
use creativestalk_core::portfolio::PortfolioRecord;
use serde::Serialize;

use crate::media_host::{DestroyOutcome, MediaHost};
use crate::record_store::RecordStore;

/// How a removal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// Removed and confirmed absent.
    Deleted,
    /// No such record to begin with.
    AlreadyAbsent,
    /// The Record Store is not configured; nothing was attempted.
    StoreUnconfigured,
    /// The initial lookup failed.
    LookupFailed,
    /// Every delete attempt failed.
    DeleteFailed { attempts: u32 },
    /// A delete reported success but the record is still there.
    VerificationMismatch,
    /// The confirming lookup failed, so success cannot be claimed.
    VerifyFailed,
}

impl DeletionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deleted | Self::AlreadyAbsent)
    }
}

/// States of a single removal.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionState {
    Fetching,
    /// `None` when the store has no such record.
    Resolved(Option<PortfolioRecord>),
    MediaCleanup(PortfolioRecord),
    RecordDelete { attempt: u32 },
    Verify,
    Done(DeletionOutcome),
}

impl DeletionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Resolved(_) => "resolved",
            Self::MediaCleanup(_) => "media_cleanup",
            Self::RecordDelete { .. } => "record_delete",
            Self::Verify => "verify",
            Self::Done(_) => "done",
        }
    }
}

/// Drives one removal to completion.
pub(crate) struct Deletion<'a> {
    pub store: &'a dyn RecordStore,
    pub media: Option<&'a dyn MediaHost>,
    pub id: &'a str,
    pub max_attempts: u32,
}

impl Deletion<'_> {
    pub async fn run(self) -> DeletionOutcome {
        let mut state = DeletionState::Fetching;
        loop {
            tracing::debug!(record_id = %self.id, state = state.name(), "Deletion step");
            state = match state {
                DeletionState::Done(outcome) => return outcome,
                other => self.step(other).await,
            };
        }
    }

    async fn step(&self, state: DeletionState) -> DeletionState {
        match state {
            DeletionState::Fetching => match self.store.select_by_id(self.id).await {
                Ok(found) => DeletionState::Resolved(found),
                Err(e) => {
                    tracing::warn!(record_id = %self.id, error = %e, "Lookup before delete failed");
                    DeletionState::Done(DeletionOutcome::LookupFailed)
                }
            },

            DeletionState::Resolved(None) => {
                tracing::info!(record_id = %self.id, "Record already absent");
                DeletionState::Done(DeletionOutcome::AlreadyAbsent)
            }
            DeletionState::Resolved(Some(record)) if record.media.is_hosted() => {
                DeletionState::MediaCleanup(record)
            }
            DeletionState::Resolved(Some(_)) => DeletionState::RecordDelete { attempt: 1 },

            DeletionState::MediaCleanup(record) => {
                self.cleanup_media(&record).await;
                DeletionState::RecordDelete { attempt: 1 }
            }

            DeletionState::RecordDelete { attempt } => {
                let use_procedure = attempt > 1 && self.store.supports_delete_procedure();
                let result = if use_procedure {
                    self.store.delete_via_procedure(self.id).await
                } else {
                    self.store.delete(self.id).await
                };
                match result {
                    Ok(()) => DeletionState::Verify,
                    Err(e) if attempt < self.max_attempts => {
                        tracing::warn!(
                            record_id = %self.id,
                            attempt,
                            procedure = use_procedure,
                            error = %e,
                            "Delete attempt failed, retrying",
                        );
                        DeletionState::RecordDelete {
                            attempt: attempt + 1,
                        }
                    }
                    Err(e) => {
                        tracing::error!(record_id = %self.id, attempts = attempt, error = %e, "Delete failed");
                        DeletionState::Done(DeletionOutcome::DeleteFailed { attempts: attempt })
                    }
                }
            }

            DeletionState::Verify => match self.store.select_by_id(self.id).await {
                Ok(None) => DeletionState::Done(DeletionOutcome::Deleted),
                Ok(Some(_)) => {
                    tracing::error!(
                        record_id = %self.id,
                        "Delete reported success but the record is still present",
                    );
                    DeletionState::Done(DeletionOutcome::VerificationMismatch)
                }
                Err(e) => {
                    tracing::warn!(record_id = %self.id, error = %e, "Verification lookup failed");
                    DeletionState::Done(DeletionOutcome::VerifyFailed)
                }
            },

            done @ DeletionState::Done(_) => done,
        }
    }

    /// Best effort: every failure is logged and swallowed.
    async fn cleanup_media(&self, record: &PortfolioRecord) {
        let url = record.media.url();
        let Some(key) = HostedAssetKey::from_url(url) else {
            tracing::warn!(record_id = %self.id, url, "Could not extract media asset key");
            return;
        };
        let Some(media) = self.media else {
            tracing::warn!(record_id = %self.id, public_id = %key.public_id, "Media Host not configured, asset left in place");
            return;
        };
        match media.destroy(&key).await {
            Ok(DestroyOutcome::Deleted) => {
                tracing::info!(record_id = %self.id, public_id = %key.public_id, "Deleted media asset");
            }
            Ok(DestroyOutcome::NotFound) => {
                tracing::info!(record_id = %self.id, public_id = %key.public_id, "Media asset already gone");
            }
            Err(e) => {
                tracing::warn!(record_id = %self.id, public_id = %key.public_id, error = %e, "Media asset cleanup failed");
            }
        }
    }
}

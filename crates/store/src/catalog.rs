//! Catalog View Model: the merged list the browsing and admin surfaces render.

use std::sync::Arc;

use creativestalk_core::catalog::{merge, merge_complete, MergedCatalogEntry};
use creativestalk_core::showcase::{builtin_showcase, BuiltInShowcaseEntry};
use creativestalk_events::{RefreshContext, RefreshSignal};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::access::PortfolioAccess;

/// Database records merged with the built-in showcase.
#[derive(Clone)]
pub struct CatalogView {
    access: Arc<PortfolioAccess>,
    builtin: Arc<[BuiltInShowcaseEntry]>,
}

impl CatalogView {
    pub fn new(access: Arc<PortfolioAccess>) -> Self {
        Self {
            access,
            builtin: builtin_showcase().into(),
        }
    }

    /// Database entries (newest first, test data hidden) followed by the
    /// built-in entries in declaration order.
    pub async fn get_merged(&self) -> Vec<MergedCatalogEntry> {
        let records = self.access.list().await;
        merge(records, &self.builtin)
    }

    /// Every store record, test data included, followed by the built-in
    /// entries. Same id rules as [`get_merged`](Self::get_merged).
    pub async fn get_complete(&self) -> Vec<MergedCatalogEntry> {
        let records = self.access.list().await;
        merge_complete(records, &self.builtin)
    }

    /// Look up one merged entry by id.
    pub async fn find(&self, id: &str) -> Option<MergedCatalogEntry> {
        self.get_merged().await.into_iter().find(|e| e.id == id)
    }

    /// Keep a merged catalog current for `context`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(&self, context: &RefreshContext) -> CatalogWatcher {
        CatalogWatcher::spawn(self.clone(), context)
    }
}

// ---------------------------------------------------------------------------
// CatalogWatcher
// ---------------------------------------------------------------------------

/// One applied catalog fetch.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Sequence number of the fetch that produced this snapshot; 0 before
    /// the first fetch settles.
    pub generation: u64,
    pub entries: Arc<Vec<MergedCatalogEntry>>,
}

/// Re-fetches the merged catalog on every refresh signal of one context.
///
/// Fetches may settle out of order; a result older than one already applied
/// is discarded. Dropping the watcher aborts in-flight fetches.
pub struct CatalogWatcher {
    receiver: watch::Receiver<CatalogSnapshot>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CatalogWatcher {
    fn spawn(view: CatalogView, context: &RefreshContext) -> Self {
        let (sender, receiver) = watch::channel(CatalogSnapshot::default());
        let mut listener = context.listen();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let context_id = context.id();

        let handle = tokio::spawn(async move {
            let mut inflight: JoinSet<(u64, Vec<MergedCatalogEntry>)> = JoinSet::new();
            let mut requested: u64 = 0;
            let mut applied: u64 = 0;

            let fetch = |set: &mut JoinSet<_>, generation: u64| {
                let view = view.clone();
                set.spawn(async move { (generation, view.get_merged().await) });
            };

            requested += 1;
            fetch(&mut inflight, requested);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                        match joined {
                            Ok((generation, _)) if generation <= applied => {
                                tracing::debug!(%context_id, generation, applied, "Discarding stale catalog fetch");
                            }
                            Ok((generation, entries)) => {
                                applied = generation;
                                sender.send_replace(CatalogSnapshot {
                                    generation,
                                    entries: Arc::new(entries),
                                });
                            }
                            Err(e) => {
                                tracing::warn!(%context_id, error = %e, "Catalog fetch task failed");
                            }
                        }
                    }
                    signal = listener.recv() => match signal {
                        Some(signal) => {
                            log_signal(&signal);
                            requested += 1;
                            fetch(&mut inflight, requested);
                        }
                        None => break,
                    },
                }
            }
            inflight.abort_all();
            tracing::debug!(%context_id, "Catalog watcher stopped");
        });

        Self {
            receiver,
            cancel,
            handle: Some(handle),
        }
    }

    /// The most recently applied catalog.
    pub fn current(&self) -> CatalogSnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait until a newer catalog is applied. `None` once the watcher task
    /// has ended.
    pub async fn changed(&mut self) -> Option<CatalogSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Stop watching and wait for the task to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn log_signal(signal: &RefreshSignal) {
    match signal {
        RefreshSignal::CrossContext { origin, at } => {
            tracing::debug!(%origin, %at, "Catalog changed in another context");
        }
        RefreshSignal::Missed { skipped } => {
            tracing::debug!(skipped, "Refresh signals missed, re-fetching once");
        }
        other => tracing::debug!(signal = ?other, "Catalog refresh requested"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use creativestalk_core::catalog::EntrySource;
    use creativestalk_core::portfolio::{MediaReference, NewPortfolioItem};
    use creativestalk_events::RefreshHub;

    use super::*;
    use crate::config::AccessConfig;
    use crate::memory::InMemoryRecordStore;
    use crate::record_store::RecordStore;

    fn item(title: &str) -> NewPortfolioItem {
        NewPortfolioItem::new(
            title,
            "videos",
            MediaReference::Link("https://youtu.be/abc".into()),
            "https://img/abc.jpg",
        )
    }

    fn view_over(store: Arc<InMemoryRecordStore>) -> CatalogView {
        let access = PortfolioAccess::new(
            Some(store as Arc<dyn RecordStore>),
            None,
            AccessConfig::default(),
        );
        CatalogView::new(Arc::new(access))
    }

    async fn next(watcher: &mut CatalogWatcher) -> CatalogSnapshot {
        tokio::time::timeout(Duration::from_secs(1), watcher.changed())
            .await
            .expect("catalog should update")
            .expect("watcher should be running")
    }

    #[tokio::test]
    async fn merged_view_puts_database_entries_first() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.insert(&item("Brand film")).await.unwrap();
        store.insert(&item("test upload")).await.unwrap();
        let view = view_over(store);

        let entries = view.get_merged().await;
        assert_eq!(entries.len(), 1 + builtin_showcase().len());
        assert_eq!(entries[0].title, "Brand film");
        assert!(entries[1..].iter().all(|e| e.source == EntrySource::Code));
    }

    #[tokio::test]
    async fn complete_view_keeps_test_data() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.insert(&item("Brand film")).await.unwrap();
        store.insert(&item("test upload")).await.unwrap();
        let view = view_over(store);

        let entries = view.get_complete().await;
        assert_eq!(entries.len(), 2 + builtin_showcase().len());
        assert!(entries.iter().any(|e| e.title == "test upload"));
    }

    #[tokio::test]
    async fn unconfigured_store_shows_builtin_only() {
        let view = CatalogView::new(Arc::new(PortfolioAccess::unconfigured()));
        let entries = view.get_merged().await;
        assert_eq!(entries.len(), builtin_showcase().len());
        assert!(view.find("teliyadhe").await.is_some());
    }

    #[tokio::test]
    async fn watcher_refetches_on_refresh_signal() {
        let store = Arc::new(InMemoryRecordStore::new());
        let view = view_over(Arc::clone(&store));
        let hub = Arc::new(RefreshHub::default());
        let admin = hub.context();
        let browser = hub.context();

        let mut watcher = view.watch(&browser);
        let initial = next(&mut watcher).await;
        assert_eq!(initial.generation, 1);
        let baseline = initial.entries.len();

        store.insert(&item("Fresh upload")).await.unwrap();
        admin.publish();

        let refreshed = next(&mut watcher).await;
        assert!(refreshed.generation > initial.generation);
        assert_eq!(refreshed.entries.len(), baseline + 1);
        assert_eq!(refreshed.entries[0].title, "Fresh upload");
    }

    #[tokio::test]
    async fn stopped_watcher_ignores_later_signals() {
        let store = Arc::new(InMemoryRecordStore::new());
        let view = view_over(Arc::clone(&store));
        let hub = Arc::new(RefreshHub::default());
        let admin = hub.context();
        let browser = hub.context();

        let mut watcher = view.watch(&browser);
        next(&mut watcher).await;
        let mut receiver = watcher.receiver.clone();
        watcher.stop().await;

        let lists_before = store.calls().await.list;
        admin.publish();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.calls().await.list, lists_before);
        assert!(receiver.changed().await.is_err(), "sender is gone");
    }
}

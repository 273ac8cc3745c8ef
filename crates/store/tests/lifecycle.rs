//! Record lifecycle properties over the in-memory backends.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use creativestalk_core::catalog::{filter_by_category, EntrySource};
use creativestalk_core::portfolio::{MediaReference, NewPortfolioItem};
use creativestalk_core::showcase::builtin_showcase;
use creativestalk_store::memory::{DeleteBehavior, InMemoryRecordStore, LookupBehavior};
use creativestalk_store::{AccessConfig, CatalogView, PortfolioAccess, RecordStore};

fn quick() -> AccessConfig {
    AccessConfig {
        bulk_delay: Duration::ZERO,
        ..AccessConfig::default()
    }
}

fn access_over(store: &Arc<InMemoryRecordStore>) -> PortfolioAccess {
    PortfolioAccess::new(
        Some(Arc::clone(store) as Arc<dyn RecordStore>),
        None,
        quick(),
    )
}

fn item(title: &str, category: &str) -> NewPortfolioItem {
    NewPortfolioItem::new(
        title,
        category,
        MediaReference::Link(format!("https://youtu.be/{}", title.replace(' ', "-"))),
        "https://img/poster.jpg",
    )
}

/// Small deterministic generator so fault schedules are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn pick<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[(self.next() % choices.len() as u64) as usize]
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clean_add_then_list() {
    let store = Arc::new(InMemoryRecordStore::new());
    let access = access_over(&store);

    let added = access.add(item("Wedding Film", "videos")).await.unwrap();
    let listed = access.list().await;

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], added);
    assert!(!added.id.is_empty());
}

#[tokio::test]
async fn delete_of_unknown_id_reports_success_without_side_effects() {
    let store = Arc::new(InMemoryRecordStore::new());
    let access = access_over(&store);
    access.add(item("Keeper", "videos")).await.unwrap();

    assert!(access.remove("no-such-id").await);
    assert_eq!(access.list().await.len(), 1);
    assert_eq!(store.calls().await.delete, 0);
}

#[tokio::test]
async fn unconfigured_store_scenario() {
    let access = Arc::new(PortfolioAccess::unconfigured());
    assert!(access.list().await.is_empty());
    assert!(access.add(item("Reel", "reels")).await.is_err());
    assert!(!access.remove("x").await);

    let merged = CatalogView::new(access).get_merged().await;
    assert_eq!(merged.len(), builtin_showcase().len());
    assert!(merged.iter().all(|e| e.source == EntrySource::Code));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_is_idempotent() {
    let store = Arc::new(InMemoryRecordStore::new());
    let access = access_over(&store);
    let id = access.add(item("Promo", "promos")).await.unwrap().id;

    assert!(access.remove(&id).await);
    let after_first = access.list().await;
    assert!(access.remove(&id).await);
    assert_eq!(access.list().await, after_first);
}

#[tokio::test]
async fn remove_never_reports_success_while_record_is_fetchable() {
    let behaviors = [
        DeleteBehavior::Apply,
        DeleteBehavior::Fail,
        DeleteBehavior::SilentNoop,
    ];
    let lookups = [
        LookupBehavior::Answer,
        LookupBehavior::Answer,
        LookupBehavior::Fail,
    ];

    for seed in 1..=64u64 {
        let mut rng = XorShift(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let store = if seed % 2 == 0 {
            Arc::new(InMemoryRecordStore::new().with_delete_procedure())
        } else {
            Arc::new(InMemoryRecordStore::new())
        };
        let access = access_over(&store);

        let mut ids = Vec::new();
        for n in 0..4 {
            ids.push(access.add(item(&format!("Clip {n}"), "reels")).await.unwrap().id);
        }
        for _ in 0..8 {
            store
                .script_deletes([rng.pick(&behaviors), rng.pick(&behaviors)])
                .await;
            store.script_procedure([rng.pick(&behaviors)]).await;
            store
                .script_lookups([rng.pick(&lookups), rng.pick(&lookups)])
                .await;
        }

        for id in &ids {
            let outcome = access.remove_detailed(id).await;
            if outcome.is_success() {
                assert!(
                    !store.contains(id).await,
                    "seed {seed}: {outcome:?} reported for a record that is still present"
                );
            }
        }
    }
}

#[tokio::test]
async fn bulk_remove_partitions_every_requested_id() {
    let store = Arc::new(InMemoryRecordStore::new());
    let access = access_over(&store);
    let mut ids = Vec::new();
    for n in 0..6 {
        ids.push(access.add(item(&format!("Reel {n}"), "reels")).await.unwrap().id);
    }
    ids.push("never-existed".into());
    store
        .script_deletes([
            DeleteBehavior::Apply,
            DeleteBehavior::Fail,
            DeleteBehavior::Fail,
            DeleteBehavior::SilentNoop,
        ])
        .await;

    let result = access.bulk_remove(&ids).await;

    let succeeded: HashSet<&String> = result.succeeded.iter().collect();
    let failed: HashSet<&String> = result.failed.iter().collect();
    let requested: HashSet<&String> = ids.iter().collect();
    assert!(succeeded.is_disjoint(&failed));
    assert_eq!(&succeeded | &failed, requested);
    for id in &result.succeeded {
        assert!(!store.contains(id).await);
    }
    assert!(!result.failed.is_empty());
}

#[tokio::test]
async fn merged_catalog_has_no_duplicate_ids_and_filters_are_subsequences() {
    let store = Arc::new(InMemoryRecordStore::new());
    let access = Arc::new(access_over(&store));
    for (title, category) in [
        ("Launch", "promos"),
        ("Podcast ep 1", "podcasts"),
        ("dummy entry", "videos"),
        ("Wedding", "videos"),
    ] {
        access.add(item(title, category)).await.unwrap();
    }
    let view = CatalogView::new(access);
    let merged = view.get_merged().await;

    let unique: HashSet<&str> = merged.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(unique.len(), merged.len());
    assert!(!merged.iter().any(|e| e.title == "dummy entry"));

    let first_code = merged
        .iter()
        .position(|e| e.source == EntrySource::Code)
        .unwrap();
    assert!(merged[..first_code]
        .iter()
        .all(|e| e.source == EntrySource::Database));
    assert!(merged[first_code..]
        .iter()
        .all(|e| e.source == EntrySource::Code));

    for category in ["videos", "reels", "promos", "all"] {
        let filtered = filter_by_category(merged.clone(), category);
        let mut rest = merged.iter();
        for entry in &filtered {
            assert!(
                rest.any(|e| e == entry),
                "filtered list for {category} is not a subsequence"
            );
        }
    }
}

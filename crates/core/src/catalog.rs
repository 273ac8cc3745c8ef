//! Merged catalog: database records plus built-in showcase entries.
//!
//! The functions here are pure; `creativestalk-store` feeds them with the
//! records fetched from the Record Store.
//!
//! Ordering contract of [`merge`]: database-sourced entries first (store
//! order), then built-in entries (declaration order), with no id appearing
//! twice.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::categories::CATEGORY_ALL;
use crate::error::CoreError;
use crate::portfolio::{MediaReference, PortfolioRecord, UploadType};
use crate::showcase::BuiltInShowcaseEntry;
use crate::types::{RecordId, Timestamp};

/// Placeholder content left behind by manual testing of the upload form.
static TEST_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:test|testing|sample|dummy|asdf|lorem\s+ipsum)\b").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Where a catalog entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Persisted in the Record Store; editable.
    Database,
    /// Built into the binary; read-only.
    Code,
}

/// Source filter used by the admin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFilter {
    #[default]
    All,
    Only(EntrySource),
}

impl SourceFilter {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "all" => Ok(Self::All),
            "database" => Ok(Self::Only(EntrySource::Database)),
            "code" => Ok(Self::Only(EntrySource::Code)),
            other => Err(CoreError::Validation(format!(
                "Unknown source '{other}'. Must be one of: all, database, code"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MergedCatalogEntry
// ---------------------------------------------------------------------------

/// Display shape shared by both sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedCatalogEntry {
    pub id: RecordId,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    /// Video link or hosted URL. Built-in entries may have none.
    pub media_url: Option<String>,
    pub upload_type: UploadType,
    pub thumbnail: String,
    pub views: Option<String>,
    /// `None` for built-in entries.
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub source: EntrySource,
}

impl MergedCatalogEntry {
    pub fn is_mutable(&self) -> bool {
        self.source == EntrySource::Database
    }

    fn looks_like_test_data(&self) -> bool {
        TEST_DATA_RE.is_match(&self.title)
            || TEST_DATA_RE.is_match(&self.category)
            || self
                .description
                .as_deref()
                .is_some_and(|d| TEST_DATA_RE.is_match(d))
    }
}

impl From<PortfolioRecord> for MergedCatalogEntry {
    fn from(record: PortfolioRecord) -> Self {
        let upload_type = record.upload_type();
        let media_url = match record.media {
            MediaReference::Link(url) | MediaReference::Hosted(url) => url,
        };
        Self {
            id: record.id,
            title: record.title,
            category: record.category,
            description: record.description,
            media_url: Some(media_url),
            upload_type,
            thumbnail: record.thumbnail,
            views: record.views,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
            source: EntrySource::Database,
        }
    }
}

impl From<&BuiltInShowcaseEntry> for MergedCatalogEntry {
    fn from(entry: &BuiltInShowcaseEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            category: entry.category.clone(),
            description: entry.description.clone(),
            media_url: entry.video_url.clone(),
            upload_type: UploadType::Link,
            thumbnail: entry.thumbnail.clone(),
            views: entry.views.clone(),
            created_at: None,
            updated_at: None,
            source: EntrySource::Code,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge & filters
// ---------------------------------------------------------------------------

/// Merge store records with the given built-in entries.
///
/// Test-data records are dropped. A built-in entry whose id is already used
/// by a database record is skipped.
pub fn merge(
    records: Vec<PortfolioRecord>,
    builtin: &[BuiltInShowcaseEntry],
) -> Vec<MergedCatalogEntry> {
    merge_entries(records, builtin, true)
}

/// Same ordering and id rules as [`merge`], but every store record is kept.
/// Used for backups.
pub fn merge_complete(
    records: Vec<PortfolioRecord>,
    builtin: &[BuiltInShowcaseEntry],
) -> Vec<MergedCatalogEntry> {
    merge_entries(records, builtin, false)
}

fn merge_entries(
    records: Vec<PortfolioRecord>,
    builtin: &[BuiltInShowcaseEntry],
    hide_test_data: bool,
) -> Vec<MergedCatalogEntry> {
    let mut seen: HashSet<RecordId> = HashSet::new();
    let mut merged = Vec::with_capacity(records.len() + builtin.len());

    for record in records {
        let entry = MergedCatalogEntry::from(record);
        if hide_test_data && entry.looks_like_test_data() {
            tracing::debug!(record_id = %entry.id, "Hiding test-data record from catalog");
            continue;
        }
        if seen.insert(entry.id.clone()) {
            merged.push(entry);
        }
    }

    for entry in builtin {
        if seen.insert(entry.id.clone()) {
            merged.push(MergedCatalogEntry::from(entry));
        } else {
            tracing::warn!(id = %entry.id, "Built-in showcase id shadowed by a database record");
        }
    }

    merged
}

/// Keep entries whose category equals `category` exactly; `"all"` keeps
/// everything. Relative order is preserved.
pub fn filter_by_category(
    entries: Vec<MergedCatalogEntry>,
    category: &str,
) -> Vec<MergedCatalogEntry> {
    if category == CATEGORY_ALL {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| e.category == category)
        .collect()
}

pub fn filter_by_source(
    entries: Vec<MergedCatalogEntry>,
    filter: SourceFilter,
) -> Vec<MergedCatalogEntry> {
    match filter {
        SourceFilter::All => entries,
        SourceFilter::Only(source) => entries.into_iter().filter(|e| e.source == source).collect(),
    }
}

/// Case-insensitive substring search over title, category and description.
pub fn search(entries: Vec<MergedCatalogEntry>, term: &str) -> Vec<MergedCatalogEntry> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| {
            e.title.to_lowercase().contains(&needle)
                || e.category.to_lowercase().contains(&needle)
                || e
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Entry counts per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub database: usize,
    pub code: usize,
    pub total: usize,
}

pub fn source_stats(entries: &[MergedCatalogEntry]) -> SourceStats {
    let database = entries
        .iter()
        .filter(|e| e.source == EntrySource::Database)
        .count();
    SourceStats {
        database,
        code: entries.len() - database,
        total: entries.len(),
    }
}

/// Reject edits and deletes of built-in entries.
pub fn ensure_mutable(entry: &MergedCatalogEntry) -> Result<(), CoreError> {
    if entry.is_mutable() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "'{}' is a built-in entry and cannot be edited or deleted",
            entry.title
        )))
    }
}

/// Whether `id` resolves to a read-only entry of a merged list. A database
/// record that reuses a built-in id is editable.
pub fn is_read_only(entries: &[MergedCatalogEntry], id: &str) -> bool {
    entries.iter().any(|e| e.id == id && !e.is_mutable())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(id: &str, title: &str, category: &str) -> PortfolioRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        PortfolioRecord {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            description: None,
            media: MediaReference::Link(format!("https://youtu.be/{id}")),
            thumbnail: format!("https://img/{id}.jpg"),
            views: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn builtin(id: &str, category: &str) -> BuiltInShowcaseEntry {
        BuiltInShowcaseEntry {
            id: id.into(),
            title: format!("Built-in {id}"),
            category: category.into(),
            description: None,
            video_url: None,
            thumbnail: format!("https://img/{id}.jpg"),
            views: Some("1K+ Views".into()),
        }
    }

    fn ids(entries: &[MergedCatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn database_entries_precede_builtin_in_original_order() {
        let merged = merge(
            vec![record("d2", "Launch", "promos"), record("d1", "Wedding", "videos")],
            &[builtin("b1", "reels"), builtin("b2", "videos")],
        );
        assert_eq!(ids(&merged), ["d2", "d1", "b1", "b2"]);
        assert_eq!(merged[0].source, EntrySource::Database);
        assert_eq!(merged[3].source, EntrySource::Code);
    }

    #[test]
    fn colliding_builtin_id_is_not_duplicated() {
        let merged = merge(vec![record("b1", "Reel", "reels")], &[builtin("b1", "reels")]);
        assert_eq!(ids(&merged), ["b1"]);
        assert_eq!(merged[0].source, EntrySource::Database);
    }

    #[test]
    fn test_data_records_are_hidden_case_insensitively() {
        let mut described = record("d3", "Brand film", "videos");
        described.description = Some("Lorem Ipsum dolor".into());
        let merged = merge(
            vec![
                record("d1", "TEST upload", "videos"),
                record("d2", "Testimonial reel", "reels"),
                described,
                record("d4", "Promo", "Sample"),
            ],
            &[],
        );
        assert_eq!(ids(&merged), ["d2"]);
    }

    #[test]
    fn empty_store_yields_builtin_only() {
        let merged = merge(Vec::new(), &[builtin("b1", "reels")]);
        assert_eq!(ids(&merged), ["b1"]);
    }

    #[test]
    fn category_filter_is_order_preserving_subsequence() {
        let entries = merge(
            vec![
                record("d1", "One", "videos"),
                record("d2", "Two", "reels"),
                record("d3", "Three", "videos"),
            ],
            &[builtin("b1", "videos"), builtin("b2", "animation")],
        );
        let videos = filter_by_category(entries.clone(), "videos");
        assert_eq!(ids(&videos), ["d1", "d3", "b1"]);

        let all = filter_by_category(entries.clone(), CATEGORY_ALL);
        assert_eq!(all, entries);

        assert!(filter_by_category(entries, "Videos").is_empty(), "match is exact");
    }

    #[test]
    fn source_filter_and_stats() {
        let entries = merge(
            vec![record("d1", "One", "videos")],
            &[builtin("b1", "videos"), builtin("b2", "reels")],
        );
        assert_eq!(
            source_stats(&entries),
            SourceStats { database: 1, code: 2, total: 3 }
        );
        let code = filter_by_source(entries, SourceFilter::Only(EntrySource::Code));
        assert_eq!(ids(&code), ["b1", "b2"]);
    }

    #[test]
    fn search_matches_title_category_and_description() {
        let mut described = record("d2", "Brand film", "promos");
        described.description = Some("Shot for a Coffee roaster".into());
        let entries = merge(vec![record("d1", "Wedding day", "videos"), described], &[]);

        assert_eq!(ids(&search(entries.clone(), "WEDDING")), ["d1"]);
        assert_eq!(ids(&search(entries.clone(), "coffee")), ["d2"]);
        assert_eq!(ids(&search(entries.clone(), "promo")), ["d2"]);
        assert_eq!(search(entries.clone(), "  ").len(), 2);
    }

    #[test]
    fn source_filter_parsing() {
        assert_eq!(SourceFilter::parse("all").unwrap(), SourceFilter::All);
        assert_eq!(
            SourceFilter::parse("code").unwrap(),
            SourceFilter::Only(EntrySource::Code)
        );
        assert_matches!(SourceFilter::parse("cdn"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn builtin_entries_are_immutable() {
        let entries = merge(vec![record("d1", "One", "videos")], &[builtin("b1", "reels")]);
        assert!(ensure_mutable(&entries[0]).is_ok());
        assert_matches!(ensure_mutable(&entries[1]), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn read_only_follows_merged_source() {
        let entries = merge(
            vec![record("b1", "Reel", "reels")],
            &[builtin("b1", "reels"), builtin("b2", "videos")],
        );
        assert!(!is_read_only(&entries, "b1"), "database record shadows the built-in");
        assert!(is_read_only(&entries, "b2"));
        assert!(!is_read_only(&entries, "missing"));
    }

    #[test]
    fn complete_merge_keeps_test_data() {
        let records = vec![record("d1", "TEST upload", "videos"), record("d2", "Launch", "promos")];
        assert_eq!(ids(&merge(records.clone(), &[builtin("b1", "reels")])), ["d2", "b1"]);
        assert_eq!(
            ids(&merge_complete(records, &[builtin("b1", "reels")])),
            ["d1", "d2", "b1"]
        );
    }
}

//! JSON backup of the admin catalog.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::MergedCatalogEntry;
use crate::error::CoreError;

/// Download filename for a backup taken on `date`.
pub fn backup_filename(date: NaiveDate) -> String {
    format!("portfolio-backup-{}.json", date.format("%Y-%m-%d"))
}

#[derive(Serialize)]
struct Backup<'a> {
    exported_at: String,
    count: usize,
    items: &'a [MergedCatalogEntry],
}

/// Pretty-printed JSON backup of `entries`.
pub fn backup_json(
    entries: &[MergedCatalogEntry],
    exported_at: chrono::DateTime<chrono::Utc>,
) -> Result<String, CoreError> {
    let backup = Backup {
        exported_at: exported_at.to_rfc3339(),
        count: entries.len(),
        items: entries,
    };
    serde_json::to_string_pretty(&backup)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize backup: {e}")))
}

//! Built-in showcase entries.
//!
//! These are fixed at compile time (embedded from `showcase.json`), parsed
//! once on first use and never created, mutated or deleted at runtime.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Embedded showcase definition.
const SHOWCASE_JSON: &str = include_str!("showcase.json");

static BUILTIN_SHOWCASE: LazyLock<Vec<BuiltInShowcaseEntry>> =
    LazyLock::new(|| match parse_showcase(SHOWCASE_JSON) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "Embedded showcase is invalid, serving none");
            Vec::new()
        }
    });

/// A compile-time-fixed showcase entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltInShowcaseEntry {
    /// Source-defined string key.
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// External video link, when the entry has one.
    #[serde(default)]
    pub video_url: Option<String>,
    pub thumbnail: String,
    #[serde(default)]
    pub views: Option<String>,
}

/// The built-in entries in declaration order.
pub fn builtin_showcase() -> &'static [BuiltInShowcaseEntry] {
    &BUILTIN_SHOWCASE
}

/// Parse and check a showcase definition.
///
/// Every entry needs a non-blank id, title and category; ids must be unique.
pub fn parse_showcase(json: &str) -> Result<Vec<BuiltInShowcaseEntry>, CoreError> {
    let entries: Vec<BuiltInShowcaseEntry> = serde_json::from_str(json)
        .map_err(|e| CoreError::Internal(format!("Malformed showcase definition: {e}")))?;

    let mut seen = HashSet::new();
    for entry in &entries {
        if entry.id.trim().is_empty()
            || entry.title.trim().is_empty()
            || entry.category.trim().is_empty()
        {
            return Err(CoreError::Internal(format!(
                "Showcase entry '{}' is missing a required field",
                entry.id
            )));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(CoreError::Internal(format!(
                "Duplicate showcase id '{}'",
                entry.id
            )));
        }
    }
    Ok(entries)
}

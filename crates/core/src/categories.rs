//! Category tags.
//!
//! Categories are open-ended strings at the storage level; the set below is
//! only what the upload and admin forms suggest.

use serde::Serialize;

use crate::error::CoreError;

/// Sentinel that disables category filtering.
pub const CATEGORY_ALL: &str = "all";

/// A suggested category with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub id: &'static str,
    pub label: &'static str,
}

pub const SUGGESTED_CATEGORIES: &[CategoryOption] = &[
    CategoryOption { id: "videos", label: "Video Edits" },
    CategoryOption { id: "reels", label: "Reel Edits" },
    CategoryOption { id: "animation", label: "Animation" },
    CategoryOption { id: "podcasts", label: "Podcasts" },
    CategoryOption { id: "promos", label: "Promos" },
];

/// Display label for a suggested category id.
pub fn label_for(id: &str) -> Option<&'static str> {
    SUGGESTED_CATEGORIES
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.label)
}

/// Pick the category for a new record.
///
/// A non-blank custom category overrides the selected one. The filter
/// sentinel `"all"` is never a valid record category.
pub fn resolve_category(
    selected: Option<&str>,
    custom: Option<&str>,
) -> Result<String, CoreError> {
    let pick = custom
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| selected.map(str::trim).filter(|c| !c.is_empty()))
        .ok_or_else(|| CoreError::Validation("Category is required".into()))?;

    if pick.eq_ignore_ascii_case(CATEGORY_ALL) {
        return Err(CoreError::Validation(format!(
            "'{CATEGORY_ALL}' is reserved and cannot be used as a category"
        )));
    }
    Ok(pick.to_string())
}

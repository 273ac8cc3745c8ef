//! Handlers for the merged catalog and the category list.
//!
//! These are the public browsing surfaces; they never fail because of the
//! Record Store. An unreachable store shows the built-in showcase only.

use axum::extract::{Path, Query, State};
use axum::Json;
use creativestalk_core::catalog::{
    filter_by_category, filter_by_source, search, source_stats, MergedCatalogEntry, SourceFilter,
    SourceStats,
};
use creativestalk_core::categories::{label_for, CategoryOption, SUGGESTED_CATEGORIES};
use creativestalk_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// Exact category, or `all`.
    pub category: Option<String>,
    /// `all`, `database` or `code`.
    pub source: Option<String>,
    /// Case-insensitive search term.
    pub q: Option<String>,
}

/// GET /api/v1/catalog
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> AppResult<Json<DataResponse<Vec<MergedCatalogEntry>>>> {
    let source = match params.source.as_deref() {
        Some(raw) => SourceFilter::parse(raw)?,
        None => SourceFilter::All,
    };

    let mut entries = state.catalog.get_merged().await;
    entries = filter_by_source(entries, source);
    if let Some(category) = params.category.as_deref() {
        entries = filter_by_category(entries, category);
    }
    if let Some(term) = params.q.as_deref() {
        entries = search(entries, term);
    }
    Ok(Json(DataResponse::new(entries)))
}

/// GET /api/v1/catalog/stats
pub async fn catalog_stats(State(state): State<AppState>) -> Json<DataResponse<SourceStats>> {
    let entries = state.catalog.get_merged().await;
    Json(DataResponse::new(source_stats(&entries)))
}

/// GET /api/v1/catalog/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<MergedCatalogEntry>>> {
    let entry = state
        .catalog
        .find(&id)
        .await
        .ok_or(CoreError::NotFound {
            entity: "CatalogEntry",
            id,
        })?;
    Ok(Json(DataResponse::new(entry)))
}

/// A category currently used by at least one catalog entry.
#[derive(Debug, Serialize)]
pub struct CategoryInUse {
    pub id: String,
    /// Suggested label, or the raw id for custom categories.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub suggested: &'static [CategoryOption],
    pub in_use: Vec<CategoryInUse>,
}

/// GET /api/v1/categories
///
/// Suggested categories for the upload form, plus every category that
/// appears in the catalog in first-seen order.
pub async fn list_categories(State(state): State<AppState>) -> Json<DataResponse<CategoriesResponse>> {
    let entries = state.catalog.get_merged().await;

    let mut in_use: Vec<CategoryInUse> = Vec::new();
    for entry in &entries {
        match in_use.iter_mut().find(|c| c.id == entry.category) {
            Some(existing) => existing.count += 1,
            None => in_use.push(CategoryInUse {
                id: entry.category.clone(),
                label: label_for(&entry.category)
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.category.clone()),
                count: 1,
            }),
        }
    }

    Json(DataResponse::new(CategoriesResponse {
        suggested: SUGGESTED_CATEGORIES,
        in_use,
    }))
}

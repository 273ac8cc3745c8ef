//! Route definitions for the merged catalog and category list.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at `/catalog`.
///
/// ```text
/// GET    /                              -> list_catalog (?category=&source=&q=)
/// GET    /stats                         -> catalog_stats
/// GET    /{id}                          -> get_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_catalog))
        .route("/stats", get(catalog::catalog_stats))
        .route("/{id}", get(catalog::get_entry))
}

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /                              -> list_categories
/// ```
pub fn categories_router() -> Router<AppState> {
    Router::new().route("/", get(catalog::list_categories))
}

//! Route definitions for the `/portfolio` resource (admin only).

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use creativestalk_core::media::MAX_UPLOAD_BYTES;

use crate::handlers::portfolio;
use crate::state::AppState;

/// Multipart overhead allowed on top of the file itself.
const UPLOAD_FORM_OVERHEAD: usize = 1024 * 1024;

/// Routes mounted at `/portfolio`.
///
/// ```text
/// POST   /                              -> add_link_item
/// POST   /upload                        -> upload_item (multipart)
/// POST   /bulk-delete                   -> bulk_delete
/// GET    /export                        -> export_backup
/// PATCH  /{id}                          -> update_item
/// DELETE /{id}                          -> delete_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(portfolio::add_link_item))
        .route(
            "/upload",
            post(portfolio::upload_item).layer(DefaultBodyLimit::max(
                MAX_UPLOAD_BYTES as usize + UPLOAD_FORM_OVERHEAD,
            )),
        )
        .route("/bulk-delete", post(portfolio::bulk_delete))
        .route("/export", get(portfolio::export_backup))
        .route(
            "/{id}",
            patch(portfolio::update_item).delete(portfolio::delete_item),
        )
}

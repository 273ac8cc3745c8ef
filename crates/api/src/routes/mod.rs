pub mod admin;
pub mod catalog;
pub mod health;
pub mod portfolio;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                              refresh channel (WebSocket)
///
/// /admin/login                                     verify admin password (POST)
///
/// /categories                                      suggested categories (GET)
///
/// /catalog                                         merged catalog (GET, ?category=&source=&q=)
/// /catalog/stats                                   database/code counts (GET)
/// /catalog/{id}                                    one merged entry (GET)
///
/// /portfolio                                       add link item (POST, admin)
/// /portfolio/upload                                multipart upload + add (POST, admin)
/// /portfolio/bulk-delete                           bulk remove (POST, admin)
/// /portfolio/export                                JSON backup download (GET, admin)
/// /portfolio/{id}                                  update, remove (PATCH, DELETE, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/admin", admin::router())
        .nest("/categories", catalog::categories_router())
        .nest("/catalog", catalog::router())
        .nest("/portfolio", portfolio::router())
}

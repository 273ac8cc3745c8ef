use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the Record Store is configured, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub store_configured: bool,
    pub media_configured: bool,
    /// Refresh listeners currently attached to the hub.
    pub refresh_listeners: usize,
}

/// GET /health -- returns service and backend configuration state.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_configured = state.access.is_store_configured();

    Json(HealthResponse {
        status: if store_configured { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_configured,
        media_configured: state.access.is_media_configured(),
        refresh_listeners: state.hub.listener_count(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

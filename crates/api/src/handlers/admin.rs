//! Handlers for the `/admin` resource.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
}

/// POST /api/v1/admin/login
///
/// Check the shared password. No session or token is issued; clients send
/// the password again on every admin request in `x-admin-password`.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    state.gate.verify(Some(&body.password))?;
    tracing::info!("Admin password accepted");
    Ok(Json(DataResponse::new(LoginResponse {
        authenticated: true,
    })))
}

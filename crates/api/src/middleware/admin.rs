//! Shared-password extractor for admin handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the admin password on every admin request.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Proof that the request carried the admin password.
///
/// Use this as an extractor parameter in any handler that requires the
/// admin gate:
///
/// ```ignore
/// async fn my_handler(_admin: AdminUser) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdminUser;

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let candidate = parts
            .headers
            .get(ADMIN_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok());

        state.gate.verify(candidate).map_err(|e| {
            tracing::debug!(path = %parts.uri.path(), "Admin password rejected");
            AppError::Core(e)
        })?;

        Ok(AdminUser)
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use creativestalk_core::error::CoreError;
use creativestalk_store::{AccessError, DeletionOutcome};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`AccessError`] for Record
/// Store and Media Host failures, and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `creativestalk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An Access Layer failure.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A delete that could not be confirmed.
    #[error("Delete of {id} did not complete: {outcome:?}")]
    Deletion { id: String, outcome: DeletionOutcome },

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Access(access) => classify_access_error(access),
            AppError::Deletion { id, outcome } => classify_deletion(id, *outcome),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Unconfigured backends map to 503; failed calls to a configured backend
/// map to 502 with the upstream detail kept in the log only.
fn classify_access_error(err: &AccessError) -> (StatusCode, &'static str, String) {
    match err {
        AccessError::StoreUnavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORE_UNAVAILABLE",
            format!("Portfolio storage is not configured: {reason}"),
        ),
        AccessError::MediaUnavailable(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "MEDIA_UNAVAILABLE",
            format!("File uploads are not available: {reason}"),
        ),
        AccessError::Core(core) => classify_core_error(core),
        AccessError::Store(e) => {
            tracing::error!(error = %e, "Record Store request failed");
            (
                StatusCode::BAD_GATEWAY,
                "STORE_ERROR",
                "Portfolio storage request failed".to_string(),
            )
        }
        AccessError::Media(e) => {
            tracing::error!(error = %e, "Media Host request failed");
            (
                StatusCode::BAD_GATEWAY,
                "MEDIA_HOST_ERROR",
                "Media upload failed".to_string(),
            )
        }
    }
}

fn classify_deletion(id: &str, outcome: DeletionOutcome) -> (StatusCode, &'static str, String) {
    match outcome {
        DeletionOutcome::StoreUnconfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORE_UNAVAILABLE",
            "Portfolio storage is not configured".to_string(),
        ),
        DeletionOutcome::VerificationMismatch => (
            StatusCode::CONFLICT,
            "VERIFICATION_MISMATCH",
            format!("Item {id} is still present after delete"),
        ),
        DeletionOutcome::LookupFailed
        | DeletionOutcome::DeleteFailed { .. }
        | DeletionOutcome::VerifyFailed => (
            StatusCode::BAD_GATEWAY,
            "DELETE_FAILED",
            format!("Could not delete item {id}"),
        ),
        DeletionOutcome::Deleted | DeletionOutcome::AlreadyAbsent => {
            tracing::error!(record_id = %id, ?outcome, "Successful delete reported as an error");
            internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use creativestalk_store::StoreError;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn core_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(CoreError::Validation("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CoreError::Forbidden("built-in".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CoreError::Unauthorized("nope".into()).into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unconfigured_backends_are_503_and_transport_is_502() {
        assert_eq!(
            status_of(AccessError::StoreUnavailable("unset".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AccessError::MediaUnavailable("unset".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AccessError::Store(StoreError::Unavailable("down".into())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AccessError::Core(CoreError::Validation("x".into())).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn verification_mismatch_is_a_conflict() {
        let err = AppError::Deletion {
            id: "7".into(),
            outcome: DeletionOutcome::VerificationMismatch,
        };
        assert_eq!(status_of(err), StatusCode::CONFLICT);

        let err = AppError::Deletion {
            id: "7".into(),
            outcome: DeletionOutcome::DeleteFailed { attempts: 2 },
        };
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use falgate_core::error::CoreError;
use falgate_pipeline::{LifecycleError, UpstreamCall};
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`LifecycleError`] for the
/// generation pipeline, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `falgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A submit/poll/fallback failure from the lifecycle manager.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded a configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut detail: Option<Value> = None;

        let (status, code, message) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Lifecycle errors ---
            AppError::Lifecycle(err) => match err {
                LifecycleError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
                }
                LifecycleError::UpstreamRejected { diagnostic } => {
                    detail = Some(diagnostic);
                    (
                        StatusCode::BAD_REQUEST,
                        "UPSTREAM_REJECTED",
                        "The image provider rejected the request".to_string(),
                    )
                }
                LifecycleError::Billing { diagnostic } => {
                    detail = Some(diagnostic);
                    (
                        StatusCode::PAYMENT_REQUIRED,
                        "BILLING_ERROR",
                        "The image provider account cannot accept requests".to_string(),
                    )
                }
                LifecycleError::Transport { during, source } => {
                    tracing::warn!(%during, error = %source, "Upstream call failed");
                    let code = match during {
                        UpstreamCall::Submit => "UPSTREAM_UNAVAILABLE",
                        UpstreamCall::Status | UpstreamCall::Result => "STATUS_CHECK_FAILED",
                    };
                    (
                        StatusCode::BAD_GATEWAY,
                        code,
                        format!("Upstream {during} failed, try again"),
                    )
                }
                LifecycleError::NotFound { job_id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Generation request {job_id} not found"),
                ),
                LifecycleError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
                LifecycleError::Store(err) => classify_sqlx_error(&err),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(&err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(detail) = detail {
            body["detail"] = detail;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

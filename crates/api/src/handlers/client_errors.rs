//! Client-side error reports.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::client_log;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/client-errors
///
/// Append an arbitrary JSON report from the frontend to the client log.
/// Unauthenticated so errors on the login page can be reported too.
pub async fn report(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<StatusCode> {
    client_log::append_report(&state.config.client_log_path, &body)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write client log: {e}")))?;
    Ok(StatusCode::NO_CONTENT)
}

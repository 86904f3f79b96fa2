//! Handlers for submitting and polling generation requests.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use falgate_core::generation::GenerationInput;
use falgate_db::models::generation_request::GenerationRequest;
use falgate_db::repositories::GenerationRequestRepo;
use falgate_pipeline::{AcceptedSubmission, LifecycleError, PollOutcome};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/generations
///
/// Submit a generation request to the provider. Returns 202 with the
/// provider's job id; the result is fetched by polling.
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<GenerationInput>,
) -> AppResult<(StatusCode, Json<DataResponse<AcceptedSubmission>>)> {
    let accepted = state.lifecycle.submit(user.user_id, input).await?;
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: accepted })))
}

/// GET /api/v1/generations/{job_id}/status
///
/// Poll the provider once and return the normalized state. Users may only
/// poll their own jobs; other jobs answer 404 so their existence is not
/// revealed. Admins may poll any job.
pub async fn poll_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(job_id): Path<String>,
) -> AppResult<Json<DataResponse<PollOutcome>>> {
    let row = GenerationRequestRepo::find_by_upstream_job_id(&state.pool, &job_id).await?;
    let visible = row
        .as_ref()
        .is_some_and(|r| r.owner_id == user.user_id || user.is_admin());
    if !visible {
        return Err(LifecycleError::NotFound { job_id }.into());
    }

    let outcome = state.lifecycle.poll(&job_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/my/generations
///
/// The caller's own requests, newest first.
pub async fn my_generations(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<GenerationRequest>>>> {
    let requests = GenerationRequestRepo::list_by_owner(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

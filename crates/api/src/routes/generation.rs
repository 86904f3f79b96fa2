//! Route definitions for generation requests.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Body limit for submissions, which may inline reference images as data URIs.
const MAX_SUBMIT_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST /                  -> submit
/// GET  /{job_id}/status   -> poll_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(generation::submit).layer(DefaultBodyLimit::max(MAX_SUBMIT_BODY_BYTES)),
        )
        .route("/{job_id}/status", get(generation::poll_status))
}

/// Routes mounted at `/my`.
///
/// ```text
/// GET /generations  -> my_generations
/// ```
pub fn my_router() -> Router<AppState> {
    Router::new().route("/generations", get(generation::my_generations))
}

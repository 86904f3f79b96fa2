//! Route definitions for reference image uploads.

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::upload::{self, MAX_UPLOAD_BODY_BYTES};
use crate::state::AppState;

/// Routes mounted at `/uploads`.
///
/// ```text
/// POST /  -> upload_images (multipart, field "images")
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        post(upload::upload_images).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
    )
}

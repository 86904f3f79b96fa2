use axum::routing::post;
use axum::Router;

use crate::handlers::client_errors;
use crate::state::AppState;

/// Routes mounted at `/client-errors`.
///
/// ```text
/// POST /  -> report (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(client_errors::report))
}

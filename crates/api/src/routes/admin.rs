//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin, models};
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires an admin.
///
/// ```text
/// GET    /users                         -> list_users
/// POST   /users                         -> create_user
/// PUT    /users/{id}                    -> set_admin
/// DELETE /users/{id}                    -> delete_user
/// PUT    /users/{id}/name               -> update_names
/// POST   /models                        -> create_model
/// GET    /generations?user_id=          -> list_generations
/// POST   /generations/{job_id}/fallback -> link_fallback
/// POST   /clear-history                 -> clear_history
/// GET    /logs                          -> read_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::set_admin).delete(admin::delete_user),
        )
        .route("/users/{id}/name", put(admin::update_names))
        .route("/models", post(models::create_model))
        .route("/generations", get(admin::list_generations))
        .route("/generations/{job_id}/fallback", post(admin::link_fallback))
        .route("/clear-history", post(admin::clear_history))
        .route("/logs", get(admin::read_logs))
}

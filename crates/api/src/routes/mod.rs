pub mod admin;
pub mod auth;
pub mod client_errors;
pub mod generation;
pub mod health;
pub mod models;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                login (public)
/// /auth/register                             always 403 (public)
/// /auth/me                                   current user (requires auth)
///
/// /generations                               submit (POST)
/// /generations/{job_id}/status               poll (GET)
/// /my/generations                            own history (GET)
/// /uploads                                   reference images -> data URIs (POST)
///
/// /models                                    catalogue (public GET)
/// /client-errors                             client error report (public POST)
///
/// /admin/users                               list, create (admin only)
/// /admin/users/{id}                          set admin flag (PUT), delete
/// /admin/users/{id}/name                     first/last name (PUT)
/// /admin/models                              add catalogue entry (POST)
/// /admin/generations                         all history, ?user_id= filter
/// /admin/generations/{job_id}/fallback       link a fallback job (POST)
/// /admin/clear-history                       purge requests and links (POST)
/// /admin/logs                                client log tail (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/generations", generation::router())
        .nest("/my", generation::my_router())
        .nest("/uploads", uploads::router())
        .nest("/models", models::router())
        .nest("/client-errors", client_errors::router())
        .nest("/admin", admin::router())
}

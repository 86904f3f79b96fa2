//! Handlers for the `/admin` resource: users, request history, fallback
//! links and the client log.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use falgate_core::error::CoreError;
use falgate_core::types::DbId;
use falgate_db::models::fallback_link::FallbackLink;
use falgate_db::models::generation_request::{GenerationListQuery, GenerationRequestWithOwner};
use falgate_db::models::user::{
    CreateUser, UpdateUserNames, UserResponse, UserWithGenerationCount,
};
use falgate_db::repositories::generation_request_repo::PurgeSummary;
use falgate_db::repositories::{GenerationRequestRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::client_log::{self, LOG_TAIL_CHARS};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: bool,
}

/// Request body for `POST /admin/generations/{job_id}/fallback`.
#[derive(Debug, Deserialize)]
pub struct LinkFallbackRequest {
    #[serde(default)]
    pub fallback_job_id: String,
}

#[derive(Debug, Serialize)]
pub struct LogTail {
    pub logs: String,
}

fn user_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("User", id))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
///
/// All users, newest first, with their generation request counts.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserWithGenerationCount>>>> {
    let users = UserRepo::list_with_generation_counts(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/v1/admin/users
///
/// Create a user. Validates password length, hashes it, and returns a safe
/// [`UserResponse`] with 201 Created. A taken username is a 409.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let username = input.username.trim();
    if username.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username and password are required".into(),
        )));
    }
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: username.to_string(),
            password_hash,
            is_admin: input.is_admin,
        },
    )
    .await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = user.id,
        is_admin = user.is_admin,
        "User created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// PUT /api/v1/admin/users/{id}
///
/// Grant or revoke admin rights. Takes effect on the user's next admin
/// request; existing tokens are re-checked against the database.
pub async fn set_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<SetAdminRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::set_admin(&state.pool, id, input.is_admin)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = id,
        is_admin = input.is_admin,
        "Admin flag changed"
    );
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/admin/users/{id}/name
///
/// Replace first and last name. Omitted names become empty.
pub async fn update_names(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserNames>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::update_names(&state.pool, id, &input)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Delete a user and their generation requests. Admins cannot delete their
/// own account.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "You cannot delete your own account".into(),
        )));
    }
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(user_not_found(id));
    }

    tracing::info!(admin_id = admin.user_id, user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Generation history
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/generations?user_id=
///
/// All requests, or one owner's, newest first, with owner usernames.
pub async fn list_generations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<GenerationListQuery>,
) -> AppResult<Json<DataResponse<Vec<GenerationRequestWithOwner>>>> {
    let requests = GenerationRequestRepo::list_with_owner(&state.pool, query.user_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/admin/generations/{job_id}/fallback
///
/// Record that `fallback_job_id` replaces the job. Later polls of the
/// original job are answered from the fallback. Repeating the same link is
/// a no-op.
pub async fn link_fallback(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(job_id): Path<String>,
    Json(input): Json<LinkFallbackRequest>,
) -> AppResult<Json<DataResponse<FallbackLink>>> {
    let link = state
        .lifecycle
        .link_fallback(&job_id, &input.fallback_job_id)
        .await?;

    tracing::info!(
        admin_id = admin.user_id,
        original = %link.original_upstream_job_id,
        fallback = %link.fallback_upstream_job_id,
        "Fallback linked"
    );
    Ok(Json(DataResponse { data: link }))
}

/// POST /api/v1/admin/clear-history
///
/// Delete every generation request and fallback link. Users are kept.
pub async fn clear_history(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<PurgeSummary>>> {
    let summary = GenerationRequestRepo::purge_all(&state.pool).await?;

    tracing::warn!(
        admin_id = admin.user_id,
        requests = summary.requests_deleted,
        fallback_links = summary.fallback_links_deleted,
        "Generation history cleared"
    );
    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Client log
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/logs
///
/// The last 20 000 characters of the client error log.
pub async fn read_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<LogTail>>> {
    let logs = client_log::read_tail(&state.config.client_log_path, LOG_TAIL_CHARS)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read client log: {e}")))?;
    Ok(Json(DataResponse {
        data: LogTail { logs },
    }))
}

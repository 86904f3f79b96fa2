//! User entity model and DTOs.

use falgate_core::roles::role_for;
use falgate_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Role name embedded in access tokens.
    pub fn role(&self) -> &'static str {
        role_for(self.is_admin)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub is_admin: bool,
    pub role: &'static str,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            role: user.role(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Admin listing row: a user plus the number of generation requests they own.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserWithGenerationCount {
    pub id: DbId,
    pub username: String,
    pub is_admin: bool,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub generation_count: i64,
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// DTO for updating a user's display names.
#[derive(Debug, Deserialize)]
pub struct UpdateUserNames {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

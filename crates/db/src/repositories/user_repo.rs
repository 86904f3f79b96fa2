//! Repository for the `users` table.

use falgate_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUserNames, User, UserWithGenerationCount};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, password_hash, is_admin, first_name, last_name, \
                        created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, password_hash, is_admin)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.password_hash)
            .bind(input.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// List all users, newest first, with the number of generation requests
    /// each one owns.
    pub async fn list_with_generation_counts(
        pool: &PgPool,
    ) -> Result<Vec<UserWithGenerationCount>, sqlx::Error> {
        sqlx::query_as::<_, UserWithGenerationCount>(
            "SELECT u.id, u.username, u.is_admin, u.first_name, u.last_name, u.created_at,
                    (SELECT COUNT(*) FROM generation_requests r WHERE r.owner_id = u.id)
                        AS generation_count
             FROM users u
             ORDER BY u.id DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Grant or revoke admin rights. Returns `None` if the user does not exist.
    pub async fn set_admin(
        pool: &PgPool,
        id: DbId,
        is_admin: bool,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("UPDATE users SET is_admin = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(is_admin)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's first and last name. Returns `None` if not found.
    pub async fn update_names(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUserNames,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET first_name = $2, last_name = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a user and, by cascade, their generation requests.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

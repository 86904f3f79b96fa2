//! Repository for the `generation_requests` table.
//!
//! Rows are created once per submission attempt and afterwards only mutated
//! by [`GenerationRequestRepo::apply_status_update`], which refuses to touch
//! a row that already reached a terminal state.

use falgate_core::lifecycle::{LifecycleState, TERMINAL_STATES};
use falgate_core::types::DbId;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::fallback_link::FallbackLink;
use crate::models::generation_request::{
    CreateGenerationRequest, GenerationRequest, GenerationRequestWithOwner, StatusUpdate,
};

/// Column list for `generation_requests` queries.
const COLUMNS: &str = "\
    id, owner_id, upstream_job_id, endpoint, prompt, \
    aspect_ratio, resolution, num_images, output_format, client_mode, \
    status, raw_status, result_url, diagnostic, created_at, updated_at";

/// Same columns qualified with the `r` alias, for joins.
const QUALIFIED_COLUMNS: &str = "\
    r.id, r.owner_id, r.upstream_job_id, r.endpoint, r.prompt, \
    r.aspect_ratio, r.resolution, r.num_images, r.output_format, r.client_mode, \
    r.status, r.raw_status, r.result_url, r.diagnostic, r.created_at, r.updated_at";

/// Rows removed by [`GenerationRequestRepo::purge_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub requests_deleted: u64,
    pub fallback_links_deleted: u64,
}

/// Provides create/lookup/update operations for generation requests.
pub struct GenerationRequestRepo;

impl GenerationRequestRepo {
    /// Insert a new request row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGenerationRequest,
    ) -> Result<GenerationRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO generation_requests \
                 (owner_id, upstream_job_id, endpoint, prompt, aspect_ratio, resolution, \
                  num_images, output_format, client_mode, status, diagnostic) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GenerationRequest>(&query)
            .bind(input.owner_id)
            .bind(&input.upstream_job_id)
            .bind(input.endpoint.as_str())
            .bind(&input.prompt)
            .bind(&input.aspect_ratio)
            .bind(&input.resolution)
            .bind(input.num_images)
            .bind(&input.output_format)
            .bind(&input.client_mode)
            .bind(input.status.as_str())
            .bind(&input.diagnostic)
            .fetch_one(pool)
            .await
    }

    /// Find a request by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generation_requests WHERE id = $1");
        sqlx::query_as::<_, GenerationRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a request by the provider's job id.
    pub async fn find_by_upstream_job_id(
        pool: &PgPool,
        upstream_job_id: &str,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM generation_requests WHERE upstream_job_id = $1");
        sqlx::query_as::<_, GenerationRequest>(&query)
            .bind(upstream_job_id)
            .fetch_optional(pool)
            .await
    }

    /// List one owner's requests, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<GenerationRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_requests \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, GenerationRequest>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Admin listing: all requests (or one owner's) with the owner's username.
    pub async fn list_with_owner(
        pool: &PgPool,
        owner_id: Option<DbId>,
    ) -> Result<Vec<GenerationRequestWithOwner>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS}, u.username \
             FROM generation_requests r \
             LEFT JOIN users u ON u.id = r.owner_id \
             WHERE ($1::BIGINT IS NULL OR r.owner_id = $1) \
             ORDER BY r.created_at DESC, r.id DESC"
        );
        sqlx::query_as::<_, GenerationRequestWithOwner>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Apply the outcome of a poll cycle in one statement.
    ///
    /// The update only applies while the row is non-terminal, and a relayed
    /// (`fallback_created`) row only accepts `fallback_created` again. Returns
    /// the updated row, or `None` when nothing was written (row missing or
    /// the transition was refused).
    pub async fn apply_status_update(
        pool: &PgPool,
        upstream_job_id: &str,
        update: &StatusUpdate,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE generation_requests \
             SET status = $2, \
                 raw_status = COALESCE($3, raw_status), \
                 result_url = $4, \
                 diagnostic = COALESCE($5, diagnostic) \
             WHERE upstream_job_id = $1 \
               AND status NOT IN ($6, $7, $8) \
               AND (status <> $9 OR $2 = $9) \
             RETURNING {COLUMNS}"
        );
        let result_url = match update.status {
            LifecycleState::Completed => update.result_url.as_deref(),
            _ => None,
        };
        sqlx::query_as::<_, GenerationRequest>(&query)
            .bind(upstream_job_id)
            .bind(update.status.as_str())
            .bind(&update.raw_status)
            .bind(result_url)
            .bind(&update.diagnostic)
            .bind(TERMINAL_STATES[0].as_str())
            .bind(TERMINAL_STATES[1].as_str())
            .bind(TERMINAL_STATES[2].as_str())
            .bind(LifecycleState::FallbackCreated.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Record that `fallback_job_id` replaces `original`'s upstream job.
    ///
    /// Inserts the link and the fallback's own request row in one
    /// transaction. Idempotent: when a link for the original already exists
    /// nothing is written and the existing link is returned with `false`.
    pub async fn create_fallback(
        pool: &PgPool,
        original: &GenerationRequest,
        fallback_job_id: &str,
    ) -> Result<(FallbackLink, bool), sqlx::Error> {
        let original_job_id = original
            .upstream_job_id
            .as_deref()
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut tx = pool.begin().await?;

        let inserted = sqlx::query_as::<_, FallbackLink>(
            "INSERT INTO fallback_links (original_upstream_job_id, fallback_upstream_job_id) \
             VALUES ($1, $2) \
             ON CONFLICT (original_upstream_job_id) DO NOTHING \
             RETURNING original_upstream_job_id, fallback_upstream_job_id, created_at",
        )
        .bind(original_job_id)
        .bind(fallback_job_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(link) = inserted else {
            let existing = sqlx::query_as::<_, FallbackLink>(
                "SELECT original_upstream_job_id, fallback_upstream_job_id, created_at \
                 FROM fallback_links WHERE original_upstream_job_id = $1",
            )
            .bind(original_job_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok((existing, false));
        };

        let row = CreateGenerationRequest::fallback_of(original, fallback_job_id);
        sqlx::query(
            "INSERT INTO generation_requests \
                 (owner_id, upstream_job_id, endpoint, prompt, aspect_ratio, resolution, \
                  num_images, output_format, client_mode, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (upstream_job_id) DO NOTHING",
        )
        .bind(row.owner_id)
        .bind(&row.upstream_job_id)
        .bind(row.endpoint.as_str())
        .bind(&row.prompt)
        .bind(&row.aspect_ratio)
        .bind(&row.resolution)
        .bind(row.num_images)
        .bind(&row.output_format)
        .bind(&row.client_mode)
        .bind(row.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((link, true))
    }

    /// Delete every request and every fallback link.
    pub async fn purge_all(pool: &PgPool) -> Result<PurgeSummary, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let links = sqlx::query("DELETE FROM fallback_links")
            .execute(&mut *tx)
            .await?;
        let requests = sqlx::query("DELETE FROM generation_requests")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(PurgeSummary {
            requests_deleted: requests.rows_affected(),
            fallback_links_deleted: links.rows_affected(),
        })
    }
}

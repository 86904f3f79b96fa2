//! Repository for the `fallback_links` table.

use sqlx::PgPool;

use crate::models::fallback_link::FallbackLink;

const COLUMNS: &str = "original_upstream_job_id, fallback_upstream_job_id, created_at";

/// Lookups for recorded job substitutions. Inserts happen together with the
/// fallback job's request row in
/// [`GenerationRequestRepo::create_fallback`](super::GenerationRequestRepo::create_fallback).
pub struct FallbackLinkRepo;

impl FallbackLinkRepo {
    /// Find the link whose original is `upstream_job_id`, if any.
    pub async fn find_by_original(
        pool: &PgPool,
        upstream_job_id: &str,
    ) -> Result<Option<FallbackLink>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM fallback_links WHERE original_upstream_job_id = $1");
        sqlx::query_as::<_, FallbackLink>(&query)
            .bind(upstream_job_id)
            .fetch_optional(pool)
            .await
    }
}

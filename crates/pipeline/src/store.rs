//! Persistence seam for the lifecycle manager.

use async_trait::async_trait;
use falgate_db::models::fallback_link::FallbackLink;
use falgate_db::models::generation_request::{
    CreateGenerationRequest, GenerationRequest, StatusUpdate,
};
use falgate_db::repositories::{FallbackLinkRepo, GenerationRequestRepo};
use falgate_db::DbPool;

/// Request records keyed by upstream job id.
///
/// `apply_status_update` must be a single conditional write: it returns
/// `None` instead of touching a terminal row, and a `fallback_created` row
/// only accepts `fallback_created`.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn create(
        &self,
        input: &CreateGenerationRequest,
    ) -> Result<GenerationRequest, sqlx::Error>;

    async fn find_by_job_id(&self, job_id: &str)
        -> Result<Option<GenerationRequest>, sqlx::Error>;

    async fn apply_status_update(
        &self,
        job_id: &str,
        update: &StatusUpdate,
    ) -> Result<Option<GenerationRequest>, sqlx::Error>;

    async fn find_fallback(&self, job_id: &str) -> Result<Option<FallbackLink>, sqlx::Error>;

    /// Record the link and the fallback's own row. Returns the stored link
    /// and whether this call created it.
    async fn create_fallback(
        &self,
        original: &GenerationRequest,
        fallback_job_id: &str,
    ) -> Result<(FallbackLink, bool), sqlx::Error>;
}

/// [`RequestStore`] backed by the PostgreSQL repositories.
#[derive(Clone)]
pub struct PgRequestStore {
    pool: DbPool,
}

impl PgRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn create(
        &self,
        input: &CreateGenerationRequest,
    ) -> Result<GenerationRequest, sqlx::Error> {
        GenerationRequestRepo::create(&self.pool, input).await
    }

    async fn find_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        GenerationRequestRepo::find_by_upstream_job_id(&self.pool, job_id).await
    }

    async fn apply_status_update(
        &self,
        job_id: &str,
        update: &StatusUpdate,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        GenerationRequestRepo::apply_status_update(&self.pool, job_id, update).await
    }

    async fn find_fallback(&self, job_id: &str) -> Result<Option<FallbackLink>, sqlx::Error> {
        FallbackLinkRepo::find_by_original(&self.pool, job_id).await
    }

    async fn create_fallback(
        &self,
        original: &GenerationRequest,
        fallback_job_id: &str,
    ) -> Result<(FallbackLink, bool), sqlx::Error> {
        GenerationRequestRepo::create_fallback(&self.pool, original, fallback_job_id).await
    }
}

//! Fallback link model: one upstream job substituted for another.

use falgate_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `fallback_links` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct FallbackLink {
    pub original_upstream_job_id: String,
    pub fallback_upstream_job_id: String,
    pub created_at: Timestamp,
}

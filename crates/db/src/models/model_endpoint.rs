//! Model endpoint catalogue entries maintained by administrators.

use falgate_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `model_endpoints` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModelEndpoint {
    pub id: DbId,
    pub name: String,
    pub endpoint: String,
    pub created_at: Timestamp,
}

/// DTO for `POST /admin/models`.
#[derive(Debug, Deserialize)]
pub struct CreateModelEndpoint {
    pub name: String,
    pub endpoint: String,
}

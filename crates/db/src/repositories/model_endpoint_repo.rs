//! Repository for the `model_endpoints` table.

use sqlx::PgPool;

use crate::models::model_endpoint::{CreateModelEndpoint, ModelEndpoint};

const COLUMNS: &str = "id, name, endpoint, created_at";

/// Provides list/create for the model endpoint catalogue.
pub struct ModelEndpointRepo;

impl ModelEndpointRepo {
    /// Add a catalogue entry.
    pub async fn create(
        pool: &PgPool,
        input: &CreateModelEndpoint,
    ) -> Result<ModelEndpoint, sqlx::Error> {
        let query = format!(
            "INSERT INTO model_endpoints (name, endpoint) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModelEndpoint>(&query)
            .bind(&input.name)
            .bind(&input.endpoint)
            .fetch_one(pool)
            .await
    }

    /// List all entries, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<ModelEndpoint>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM model_endpoints ORDER BY id DESC");
        sqlx::query_as::<_, ModelEndpoint>(&query).fetch_all(pool).await
    }
}

//! Generation request entity model and DTOs.

use falgate_core::endpoint::EndpointId;
use falgate_core::generation::GenerationInput;
use falgate_core::lifecycle::LifecycleState;
use falgate_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `generation_requests` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct GenerationRequest {
    pub id: DbId,
    pub owner_id: DbId,
    /// `None` only when the provider rejected the submission outright.
    pub upstream_job_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub endpoint: EndpointId,
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub num_images: i32,
    pub output_format: String,
    pub client_mode: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: LifecycleState,
    /// Provider status text as last observed.
    pub raw_status: Option<String>,
    pub result_url: Option<String>,
    /// Provider payload attached to terminal failures.
    pub diagnostic: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Admin listing row: a generation request plus the owner's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationRequestWithOwner {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: GenerationRequest,
    pub username: Option<String>,
}

/// DTO for inserting a generation request.
#[derive(Debug, Clone)]
pub struct CreateGenerationRequest {
    pub owner_id: DbId,
    pub upstream_job_id: Option<String>,
    pub endpoint: EndpointId,
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub num_images: i32,
    pub output_format: String,
    pub client_mode: Option<String>,
    pub status: LifecycleState,
    pub diagnostic: Option<serde_json::Value>,
}

impl CreateGenerationRequest {
    /// Build an insert DTO from validated client input.
    pub fn from_input(
        owner_id: DbId,
        input: &GenerationInput,
        endpoint: EndpointId,
        upstream_job_id: Option<String>,
        status: LifecycleState,
    ) -> Self {
        Self {
            owner_id,
            upstream_job_id,
            endpoint,
            prompt: input.prompt.clone(),
            aspect_ratio: input.aspect_ratio.clone(),
            resolution: input.resolution.clone(),
            num_images: input.num_images,
            output_format: input.output_format.clone(),
            client_mode: input.client_mode.clone(),
            status,
            diagnostic: None,
        }
    }

    /// Insert DTO for a job substituted for `original`, copying its owner,
    /// prompt and parameters.
    pub fn fallback_of(original: &GenerationRequest, fallback_job_id: &str) -> Self {
        Self {
            owner_id: original.owner_id,
            upstream_job_id: Some(fallback_job_id.to_string()),
            endpoint: original.endpoint,
            prompt: original.prompt.clone(),
            aspect_ratio: original.aspect_ratio.clone(),
            resolution: original.resolution.clone(),
            num_images: original.num_images,
            output_format: original.output_format.clone(),
            client_mode: original.client_mode.clone(),
            status: LifecycleState::Submitted,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: serde_json::Value) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }
}

/// Status change produced by one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: LifecycleState,
    pub raw_status: Option<String>,
    /// Only meaningful with `status == Completed`.
    pub result_url: Option<String>,
    pub diagnostic: Option<serde_json::Value>,
}

/// Query parameters for `GET /admin/generations`.
#[derive(Debug, Deserialize)]
pub struct GenerationListQuery {
    /// Restrict to one owner.
    pub user_id: Option<DbId>,
}

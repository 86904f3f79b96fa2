//! Handlers for the model endpoint catalogue.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use falgate_core::error::CoreError;
use falgate_db::models::model_endpoint::{CreateModelEndpoint, ModelEndpoint};
use falgate_db::repositories::ModelEndpointRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/models`.
#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
}

/// GET /api/v1/models
pub async fn list_models(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ModelEndpoint>>>> {
    let models = ModelEndpointRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: models }))
}

/// POST /api/v1/admin/models
///
/// Add a catalogue entry. Both `name` and `endpoint` are required.
pub async fn create_model(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateModelRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ModelEndpoint>>)> {
    let name = input.name.trim();
    let endpoint = input.endpoint.trim();
    if name.is_empty() || endpoint.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Both name and endpoint are required".into(),
        )));
    }

    let model = ModelEndpointRepo::create(
        &state.pool,
        &CreateModelEndpoint {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
        },
    )
    .await?;

    tracing::info!(admin_id = admin.user_id, model_id = model.id, "Model endpoint added");
    Ok((StatusCode::CREATED, Json(DataResponse { data: model })))
}

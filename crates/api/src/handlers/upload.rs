//! Reference image upload.
//!
//! Images are returned to the caller as `data:` URIs so they can be passed
//! straight back in a submission's `reference_image_urls`. Nothing is
//! stored on the server.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use falgate_core::generation::MAX_REFERENCE_IMAGES;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;

/// Multipart field carrying the images.
pub const UPLOAD_FIELD: &str = "images";

/// Per-file size limit.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Body limit for the whole upload request (all files plus multipart framing).
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_REFERENCE_IMAGES * MAX_UPLOAD_BYTES + 1024 * 1024;

/// Content type assumed when a part does not declare one.
const DEFAULT_MIME: &str = "image/png";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub data_uris: Vec<String>,
}

/// POST /api/v1/uploads
///
/// Accepts up to four `images` parts of at most 10 MiB each. Parts with
/// other names are ignored.
pub async fn upload_images(
    RequireAuth(user): RequireAuth,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<UploadResponse>>> {
    let mut data_uris = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if data_uris.len() == MAX_REFERENCE_IMAGES {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_REFERENCE_IMAGES} images may be uploaded"
            )));
        }

        let mime = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
        if !mime.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Unsupported content type '{mime}'"
            )));
        }

        let bytes = read_limited(field).await?;
        data_uris.push(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)));
    }

    if data_uris.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    tracing::debug!(user_id = user.user_id, count = data_uris.len(), "Images uploaded");
    Ok(Json(DataResponse {
        data: UploadResponse { data_uris },
    }))
}

/// Read one part, failing as soon as it exceeds [`MAX_UPLOAD_BYTES`].
async fn read_limited(mut field: Field<'_>) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "Each image must be at most {} MiB",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

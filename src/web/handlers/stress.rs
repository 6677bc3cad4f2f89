//! Stress detection handler.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::StressResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// POST /api/stress-detection - Run stress detection on an uploaded image.
///
/// Request body: multipart/form-data with an "image" file field.
pub async fn detect_stress(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StressResponse>, ApiError> {
    let max_bytes = state.stress.max_upload_bytes();
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Failed to read multipart field: {}", e);
        multipart_error(e.status(), max_bytes)
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        filename = field.file_name().map(|s| s.to_string());
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!("Failed to read image content: {}", e);
            multipart_error(e.status(), max_bytes)
        })?;
        content = Some(bytes.to_vec());
    }

    let content = content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("No image data received"))?;

    if content.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    let report = state
        .stress
        .detect(filename.as_deref(), &content)
        .await?;

    Ok(Json(report.into()))
}

fn multipart_error(status: StatusCode, max_bytes: usize) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::payload_too_large(format!(
        "Image too large (max {}MB)",
        max_bytes / 1024 / 1024
    ))
}

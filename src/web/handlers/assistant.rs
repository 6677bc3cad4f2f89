//! Assistant chat handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::web::dto::{AssistantRequest, AssistantResponse, ValidatedJson};
use crate::web::handlers::AppState;

/// Reply sent when the provider call fails.
pub const ASSISTANT_FAILURE: &str = "Sorry, something went wrong while communicating with the AI.";

/// POST /api/chat - Ask the assistant.
pub async fn assistant_chat(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AssistantRequest>,
) -> impl IntoResponse {
    match state.assistant.reply(&req.message).await {
        Ok(response) => (StatusCode::OK, Json(AssistantResponse { response })),
        Err(e) => {
            tracing::error!("Error communicating with the assistant: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AssistantResponse {
                    response: ASSISTANT_FAILURE.to_string(),
                }),
            )
        }
    }
}

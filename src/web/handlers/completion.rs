// POST /api/completions — run a prompt through the moderated pipeline.
//
// Returns 200 for every modeled outcome (the body's isSuccess says which),
// 400 when the prompt is missing or the body isn't valid JSON.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use crate::pipeline::completion::MSG_VALIDATION_FAILED;
use crate::pipeline::{CompletionRequest, CompletionResult, Outcome};
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    system_message: Option<String>,
}

impl From<CompletionPayload> for CompletionRequest {
    fn from(payload: CompletionPayload) -> Self {
        CompletionRequest::new(
            payload.prompt.unwrap_or_default(),
            payload.system_message.unwrap_or_default(),
        )
    }
}

/// POST /api/completions — moderate, generate, moderate, respond.
pub async fn create_completion(
    State(state): State<AppState>,
    payload: Result<Json<CompletionPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Malformed completion request");
            return api_error(StatusCode::BAD_REQUEST, MSG_VALIDATION_FAILED);
        }
    };

    let request = CompletionRequest::from(payload);
    let outcome = state.pipeline.execute(&request).await;
    info!(outcome = outcome.label(), "Completion request handled");

    match outcome {
        Outcome::ValidationFailed => api_error(StatusCode::BAD_REQUEST, MSG_VALIDATION_FAILED),
        handled => (StatusCode::OK, Json(CompletionResult::from(handled))).into_response(),
    }
}

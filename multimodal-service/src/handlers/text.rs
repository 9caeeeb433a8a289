use crate::dtos::{ErrorResponse, GenerationResponse, TextRequest};
use crate::error::{ApiError, ValidationError};
use crate::services::providers::collect_text;
use crate::services::Part;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

/// Generate content from a text prompt
#[utoipa::path(
    post,
    path = "/text",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Generated text content", body = GenerationResponse),
        (status = 400, description = "Prompt is missing", body = ErrorResponse),
        (status = 500, description = "Upstream generation failed", body = ErrorResponse)
    ),
    tag = "Text"
)]
pub async fn generate_text(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let request = parse_request(body)?;
    let prompt = request
        .prompt
        .filter(|prompt| !prompt.is_empty())
        .ok_or(ValidationError::PromptRequired)?;

    tracing::info!(
        prompt_len = prompt.len(),
        stream = request.stream,
        "Text generation requested"
    );

    let parts = [Part::text(prompt)];
    let text = if request.stream {
        let stream = state.provider.generate_stream(&parts).await?;
        collect_text(stream).await?
    } else {
        state.provider.generate(&parts).await?.text
    };

    Ok(Json(GenerationResponse { text }))
}

/// A missing, unparsable or non-object body has no prompt. An oversized body
/// keeps its own status, and an object with mistyped fields is a bad request.
fn parse_request(body: Result<Json<Value>, JsonRejection>) -> Result<TextRequest, ApiError> {
    let value = match body {
        Ok(Json(value)) => value,
        Err(rejection @ JsonRejection::BytesRejection(_)) => {
            tracing::warn!(error = %rejection.body_text(), "Failed to read text request body");
            return Err(rejection.into());
        }
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "Text request body is not JSON");
            return Err(ValidationError::PromptRequired.into());
        }
    };

    if !value.is_object() {
        return Err(ValidationError::PromptRequired.into());
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

use super::form::{UploadForm, AUDIO_FIELD, IMAGE_FIELD, PROMPT_FIELD, TEXT_FIELD};
use super::media::{inline_image, upload_audio};
use crate::dtos::{ErrorResponse, GenerationResponse, MultimodalUpload};
use crate::error::{ApiError, ValidationError};
use crate::services::Part;
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

pub const DEFAULT_MULTIMODAL_PROMPT: &str = "Analyze these inputs.";

/// Generate content from any combination of text, image and audio
#[utoipa::path(
    post,
    path = "/multimodal",
    request_body(content = MultimodalUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Generated content based on all provided modalities", body = GenerationResponse),
        (status = 400, description = "No modality provided", body = ErrorResponse),
        (status = 500, description = "Upload or generation failed", body = ErrorResponse)
    ),
    tag = "Multimodal"
)]
pub async fn generate_from_multimodal(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let mut form = match multipart {
        Ok(multipart) => UploadForm::read(multipart).await?,
        Err(_) => return Err(ValidationError::NoModality.into()),
    };

    let text = form.text(TEXT_FIELD).map(str::to_string);
    let image = form.take_selected_file(IMAGE_FIELD);
    let audio = form.take_selected_file(AUDIO_FIELD);

    if text.is_none() && image.is_none() && audio.is_none() {
        return Err(ValidationError::NoModality.into());
    }

    tracing::info!(
        has_text = text.is_some(),
        has_image = image.is_some(),
        has_audio = audio.is_some(),
        "Multimodal generation requested"
    );

    let mut parts = vec![Part::text(
        text.unwrap_or_else(|| form.text_or(PROMPT_FIELD, DEFAULT_MULTIMODAL_PROMPT).to_string()),
    )];
    if let Some(image) = &image {
        parts.push(inline_image(&state.uploads, image).await?);
    }
    if let Some(audio) = &audio {
        parts.push(upload_audio(&state.uploads, state.provider.as_ref(), audio).await?);
    }

    let response = state.provider.generate(&parts).await?;

    Ok(Json(response.into()))
}

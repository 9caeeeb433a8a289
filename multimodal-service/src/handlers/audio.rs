use super::form::{UploadForm, AUDIO_FIELD, PROMPT_FIELD};
use super::media::upload_audio;
use crate::dtos::{AudioUpload, ErrorResponse, GenerationResponse};
use crate::error::{ApiError, ValidationError};
use crate::services::Part;
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

pub const DEFAULT_AUDIO_PROMPT: &str = "Describe this audio clip.";

/// Generate content from an audio clip
#[utoipa::path(
    post,
    path = "/audio",
    request_body(content = AudioUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Generated content based on the audio", body = GenerationResponse),
        (status = 400, description = "Audio is missing or not selected", body = ErrorResponse),
        (status = 500, description = "Upload or generation failed", body = ErrorResponse)
    ),
    tag = "Audio"
)]
pub async fn generate_from_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let mut form = match multipart {
        Ok(multipart) => UploadForm::read(multipart).await?,
        Err(_) => return Err(ValidationError::AudioRequired.into()),
    };

    let audio = form
        .take_file(AUDIO_FIELD)
        .ok_or(ValidationError::AudioRequired)?;
    if audio.file_name.is_empty() {
        return Err(ValidationError::AudioNotSelected.into());
    }
    let prompt = form.text_or(PROMPT_FIELD, DEFAULT_AUDIO_PROMPT);

    let audio_part = upload_audio(&state.uploads, state.provider.as_ref(), &audio).await?;
    let response = state
        .provider
        .generate(&[Part::text(prompt), audio_part])
        .await?;

    Ok(Json(response.into()))
}

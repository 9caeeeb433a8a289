use super::form::{UploadForm, IMAGE_FIELD, PROMPT_FIELD};
use super::media::inline_image;
use crate::dtos::{ErrorResponse, GenerationResponse, ImageUpload};
use crate::error::{ApiError, ValidationError};
use crate::services::Part;
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";

/// Generate content from an image
#[utoipa::path(
    post,
    path = "/image",
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Generated content based on the image", body = GenerationResponse),
        (status = 400, description = "Image is missing or not selected", body = ErrorResponse),
        (status = 500, description = "Upstream generation failed", body = ErrorResponse)
    ),
    tag = "Image"
)]
pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let mut form = match multipart {
        Ok(multipart) => UploadForm::read(multipart).await?,
        Err(_) => return Err(ValidationError::ImageRequired.into()),
    };

    let image = form
        .take_file(IMAGE_FIELD)
        .ok_or(ValidationError::ImageRequired)?;
    if image.file_name.is_empty() {
        return Err(ValidationError::ImageNotSelected.into());
    }
    let prompt = form.text_or(PROMPT_FIELD, DEFAULT_IMAGE_PROMPT);

    let image_part = inline_image(&state.uploads, &image).await?;
    let response = state
        .provider
        .generate(&[image_part, Part::text(prompt)])
        .await?;

    Ok(Json(response.into()))
}

//! Handler-boundary errors and their mapping to HTTP responses.

use crate::dtos::ErrorResponse;
use crate::services::{ProviderError, UploadError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Client input problems, each with a fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt is required")]
    PromptRequired,

    #[error("Image file is required")]
    ImageRequired,

    #[error("No image selected")]
    ImageNotSelected,

    #[error("Audio file is required")]
    AudioRequired,

    #[error("No audio selected")]
    AudioNotSelected,

    #[error("At least one modality (text, image, or audio) must be provided")]
    NoModality,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Body could not be read, e.g. it exceeds the configured limit.
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) | ApiError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "Generation request failed");
        } else {
            tracing::info!(error = %message, "Rejected generation request");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = ApiError::from(ValidationError::NoModality);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "At least one modality (text, image, or audio) must be provided"
        );
    }

    #[test]
    fn provider_errors_keep_their_text() {
        let err = ApiError::from(ProviderError::ApiError("quota exceeded".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "API error: quota exceeded");
    }
}

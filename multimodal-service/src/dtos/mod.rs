//! Request and response bodies, plus schema-only types for the OpenAPI document.

use crate::services::providers::ProviderResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TextRequest {
    /// Text prompt for generation.
    #[schema(example = "Write a haiku about rivers.")]
    pub prompt: Option<String>,

    /// Use the streamed call shape. The reply is still a single JSON document.
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    pub text: String,
}

impl From<ProviderResponse> for GenerationResponse {
    fn from(response: ProviderResponse) -> Self {
        Self {
            text: response.text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Prompt is required")]
    pub error: String,
}

/// Multipart body of `POST /image`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUpload {
    /// Image file to analyze.
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// Prompt for image analysis.
    #[schema(example = "Describe this image.")]
    prompt: Option<String>,
}

/// Multipart body of `POST /audio`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct AudioUpload {
    /// Audio file to analyze (MP3 recommended).
    #[schema(value_type = String, format = Binary)]
    audio: Vec<u8>,
    /// Prompt for audio analysis.
    #[schema(example = "Describe this audio clip.")]
    prompt: Option<String>,
}

/// Multipart body of `POST /multimodal`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct MultimodalUpload {
    /// Text input. Replaces `prompt` when present.
    text: Option<String>,
    /// Image file to analyze.
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
    /// Audio file to analyze.
    #[schema(value_type = Option<String>, format = Binary)]
    audio: Option<Vec<u8>>,
    /// General prompt for all modalities.
    #[schema(example = "Analyze these inputs.")]
    prompt: Option<String>,
}

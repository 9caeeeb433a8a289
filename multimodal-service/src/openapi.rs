//! OpenAPI document assembled from the handler annotations.

use crate::dtos::{
    AudioUpload, ErrorResponse, GenerationResponse, ImageUpload, MultimodalUpload, TextRequest,
};
use crate::handlers;
use utoipa::{Modify, OpenApi};

pub const API_TITLE: &str = "Multimodal Gemini API";
pub const API_VERSION: &str = "1.0";

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::pages::index,
        handlers::pages::spec,
        handlers::text::generate_text,
        handlers::image::generate_from_image,
        handlers::audio::generate_from_audio,
        handlers::multimodal::generate_from_multimodal,
    ),
    components(schemas(
        TextRequest,
        GenerationResponse,
        ErrorResponse,
        ImageUpload,
        AudioUpload,
        MultimodalUpload,
    )),
    modifiers(&InfoAddon),
    tags(
        (name = "Text", description = "Generation from a text prompt"),
        (name = "Image", description = "Generation from an uploaded image"),
        (name = "Audio", description = "Generation from an uploaded audio clip"),
        (name = "Multimodal", description = "Generation from any mix of text, image and audio"),
        (name = "Service", description = "Landing page and API description"),
    )
)]
pub struct ApiDoc;

/// Pins the document's title and version regardless of the crate metadata.
struct InfoAddon;

impl Modify for InfoAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = API_TITLE.to_string();
        openapi.info.version = API_VERSION.to_string();
        openapi.info.description =
            Some("Relays text, image, audio and mixed prompts to Gemini.".to_string());
    }
}

pub fn openapi_document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

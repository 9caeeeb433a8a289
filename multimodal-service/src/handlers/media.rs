//! Turning uploaded files into content parts for the remote model.

use super::form::UploadedFile;
use crate::error::ApiError;
use crate::services::{GenerationProvider, Part, Uploads};

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const DEFAULT_AUDIO_MIME: &str = "audio/mp3";

/// MIME type guessed from the filename extension, falling back to JPEG.
pub fn image_mime_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

/// Declared `audio/*` type, else a guess from the filename, else MP3.
pub fn audio_mime_type(file: &UploadedFile) -> String {
    let is_audio = |mime: &str| mime.starts_with("audio/");

    file.content_type
        .as_deref()
        .filter(|mime| is_audio(mime))
        .map(str::to_string)
        .or_else(|| {
            mime_guess::from_path(&file.file_name)
                .iter()
                .map(|mime| mime.essence_str().to_string())
                .find(|mime| is_audio(mime))
        })
        .unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string())
}

/// Buffer an image to disk, read it back and embed it inline.
pub async fn inline_image(uploads: &Uploads, file: &UploadedFile) -> Result<Part, ApiError> {
    let mime_type = image_mime_type(&file.file_name);
    let upload = uploads.buffer(file.data.clone(), &file.file_name).await?;
    let data = upload.read().await?;
    upload.close()?;

    tracing::info!(
        file_name = %file.file_name,
        mime_type = %mime_type,
        size = data.len(),
        "Prepared inline image"
    );

    Ok(Part::inline(mime_type, data))
}

/// Buffer an audio clip to disk and upload it to the remote file service.
///
/// The temporary file is removed whether or not the upload succeeds.
pub async fn upload_audio(
    uploads: &Uploads,
    provider: &dyn GenerationProvider,
    file: &UploadedFile,
) -> Result<Part, ApiError> {
    let mime_type = audio_mime_type(file);
    let upload = uploads.buffer(file.data.clone(), &file.file_name).await?;

    let remote = provider
        .upload_file(upload.path(), &mime_type, Some(&file.file_name))
        .await;
    upload.close()?;
    let remote = remote?;

    tracing::info!(
        file_name = %file.file_name,
        remote = %remote.name,
        mime_type = %remote.mime_type,
        size = file.data.len(),
        "Uploaded audio clip"
    );

    Ok(Part::file(&remote))
}

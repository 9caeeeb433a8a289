//! Collecting a multipart body into named text fields and files.

use crate::error::ApiError;
use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

pub const PROMPT_FIELD: &str = "prompt";
pub const TEXT_FIELD: &str = "text";
pub const IMAGE_FIELD: &str = "image";
pub const AUDIO_FIELD: &str = "audio";

/// A multipart part that carried a `filename` parameter.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// May be empty when the client submitted the field without choosing a file.
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields and files of one multipart request. The first part wins for a repeated name.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read file bytes: {}", e))
                    })?;
                    form.files.entry(name).or_insert(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read form field: {}", e))
                    })?;
                    form.fields.entry(name).or_insert(value);
                }
            }
        }

        Ok(form)
    }

    /// Non-empty text field value.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Non-empty text field value, or `default`.
    pub fn text_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.text(name).unwrap_or(default)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// Take a file only if a file was actually chosen (non-empty filename).
    pub fn take_selected_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.take_file(name).filter(|file| !file.file_name.is_empty())
    }
}

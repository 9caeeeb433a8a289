//! Remote generation provider abstractions and implementations.
//!
//! Handlers talk to the remote model only through [`GenerationProvider`], so
//! the Gemini backend can be swapped for the mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("File error: {0}")]
    FileError(String),
}

/// One piece of content sent to the remote model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Raw bytes embedded in the request.
    InlineData { mime_type: String, data: Bytes },
    /// Reference to a file previously uploaded with [`GenerationProvider::upload_file`].
    FileData { mime_type: String, file_uri: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn file(file: &RemoteFile) -> Self {
        Part::FileData {
            mime_type: file.mime_type.clone(),
            file_uri: file.uri.clone(),
        }
    }
}

/// Handle to a file stored on the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

/// Result of a non-streamed generation.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn from_api(reason: Option<&str>) -> Self {
        match reason {
            None | Some("STOP") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Other,
        }
    }
}

/// Stream chunk for streaming responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Text(String),

    /// Final chunk with usage stats.
    Complete {
        input_tokens: i32,
        output_tokens: i32,
        finish_reason: FinishReason,
    },
}

/// Type alias for provider streams.
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send>>;

/// Adapter to a remote multimodal generation model.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Single-turn generation over the given user parts.
    async fn generate(&self, parts: &[Part]) -> Result<ProviderResponse, ProviderError>;

    /// Streamed single-turn generation over the given user parts.
    async fn generate_stream(&self, parts: &[Part]) -> Result<ProviderStream, ProviderError>;

    /// Upload a local file so later requests can reference it by URI.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<RemoteFile, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

/// Drain a provider stream into one string.
///
/// Fails on the first error chunk; a content-filter finish is reported as
/// [`ProviderError::ContentFiltered`].
pub async fn collect_text(mut stream: ProviderStream) -> Result<String, ProviderError> {
    let mut text = String::new();

    while let Some(chunk) = stream.next().await {
        match chunk? {
            StreamChunk::Text(piece) => text.push_str(&piece),
            StreamChunk::Complete {
                input_tokens,
                output_tokens,
                finish_reason,
            } => {
                if finish_reason == FinishReason::ContentFilter {
                    return Err(ProviderError::ContentFiltered);
                }
                tracing::debug!(input_tokens, output_tokens, "Stream completed");
            }
        }
    }

    Ok(text)
}

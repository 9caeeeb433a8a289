//! Mock provider for testing.

use super::{
    FinishReason, GenerationProvider, Part, ProviderError, ProviderResponse, ProviderStream,
    RemoteFile, StreamChunk,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Reply with the concatenated text parts of the request.
    Echo,
    /// Reply with a fixed string.
    Reply(String),
    /// Fail generation with an API error carrying this message.
    Fail(String),
}

/// A generation call as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub streamed: bool,
    pub parts: Vec<Part>,
}

/// An upload as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    /// Whether the file was present on disk while the upload ran.
    pub existed: bool,
    pub size: u64,
    pub mime_type: String,
    pub display_name: Option<String>,
}

/// Mock generation provider that records every call.
pub struct MockProvider {
    behavior: MockBehavior,
    healthy: bool,
    fail_uploads: bool,
    calls: Mutex<Vec<RecordedCall>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            healthy: true,
            fail_uploads: false,
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new(MockBehavior::Echo)
        }
    }

    /// Reject every file upload, after recording it.
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, streamed: bool, parts: &[Part]) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                streamed,
                parts: parts.to_vec(),
            });
    }

    fn reply(&self, parts: &[Part]) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Echo => Ok(parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()),
            MockBehavior::Reply(text) => Ok(text.clone()),
            MockBehavior::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(&self, parts: &[Part]) -> Result<ProviderResponse, ProviderError> {
        self.record(false, parts);
        let text = self.reply(parts)?;

        Ok(ProviderResponse {
            output_tokens: text.split_whitespace().count() as i32,
            text,
            input_tokens: parts.len() as i32,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn generate_stream(&self, parts: &[Part]) -> Result<ProviderStream, ProviderError> {
        self.record(true, parts);
        let text = self.reply(parts)?;

        let mut chunks: Vec<Result<StreamChunk, ProviderError>> = text
            .split_inclusive(' ')
            .map(|piece| Ok(StreamChunk::Text(piece.to_string())))
            .collect();
        chunks.push(Ok(StreamChunk::Complete {
            input_tokens: parts.len() as i32,
            output_tokens: chunks.len() as i32,
            finish_reason: FinishReason::Complete,
        }));

        Ok(Box::pin(tokio_stream::iter(chunks)))
    }

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<RemoteFile, ProviderError> {
        let metadata = tokio::fs::metadata(path).await.ok();

        let mut uploads = self.uploads.lock().unwrap_or_else(|e| e.into_inner());
        let index = uploads.len();
        uploads.push(RecordedUpload {
            path: path.to_path_buf(),
            existed: metadata.is_some(),
            size: metadata.map(|m| m.len()).unwrap_or(0),
            mime_type: mime_type.to_string(),
            display_name: display_name.map(str::to_string),
        });

        if self.fail_uploads {
            return Err(ProviderError::FileError("Mock upload rejected".to_string()));
        }

        Ok(RemoteFile {
            name: format!("files/mock-{}", index),
            uri: format!("mock://files/mock-{}", index),
            mime_type: mime_type.to_string(),
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.healthy {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock provider marked unhealthy".to_string(),
            ))
        }
    }
}

//! Gemini provider implementation.
//!
//! Talks to the Generative Language REST API: `generateContent`,
//! `streamGenerateContent` over server-sent events, and the resumable
//! file-upload endpoint.

use super::{
    FinishReason, GenerationProvider, Part, ProviderError, ProviderResponse, ProviderStream,
    RemoteFile, StreamChunk,
};
use async_trait::async_trait;
use base64::Engine;
use futures::StreamExt;
use metrics::{counter, histogram};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    /// Scheme and host, without the API version path.
    pub api_base: String,
    pub timeout: Duration,
}

/// Gemini generation provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    /// Build the API URL for the configured model and method.
    fn api_url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base(), self.config.model, method)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        let key = self.config.api_key.expose_secret();
        if key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }
        Ok(key)
    }

    fn build_request(parts: &[Part]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: parts.iter().map(RequestPart::from).collect(),
            }],
        }
    }

    async fn post_generate(&self, url: &str, parts: &[Part]) -> Result<Response, ProviderError> {
        let api_key = self.api_key()?;
        let request = Self::build_request(parts);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        check_status(response).await
    }

    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<RemoteFile, ProviderError> {
        let api_key = self.api_key()?;
        let start_url = format!("{}/upload/v1beta/files", self.base());

        let start = self
            .client
            .post(&start_url)
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStartRequest {
                file: UploadFileMetadata {
                    display_name: display_name.map(str::to_string),
                },
            })
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ApiError("Upload URL missing from response".to_string()))?;

        let finalize = self
            .client
            .post(&upload_url)
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;
        let finalize = check_status(finalize).await?;

        let uploaded: UploadResponse = finalize
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse upload response: {}", e)))?;

        Ok(RemoteFile {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, parts: &[Part]) -> Result<ProviderResponse, ProviderError> {
        let started = Instant::now();

        tracing::debug!(
            model = %self.config.model,
            part_count = parts.len(),
            "Sending request to Gemini API"
        );

        let result = async {
            let response = self
                .post_generate(&self.api_url("generateContent"), parts)
                .await?;

            let api_response: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

            api_response.into_provider_response()
        }
        .await;

        record_call("generate", started, result.is_ok());
        result
    }

    async fn generate_stream(&self, parts: &[Part]) -> Result<ProviderStream, ProviderError> {
        let started = Instant::now();
        let url = format!("{}?alt=sse", self.api_url("streamGenerateContent"));

        tracing::debug!(
            model = %self.config.model,
            part_count = parts.len(),
            "Starting streaming request to Gemini API"
        );

        let response = match self.post_generate(&url, parts).await {
            Ok(response) => response,
            Err(e) => {
                record_call("generate_stream", started, false);
                return Err(e);
            }
        };
        record_call("generate_stream", started, true);

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut pending = Vec::new();
            let mut buffer = String::new();
            let mut input_tokens = 0i32;
            let mut output_tokens = 0i32;
            let mut finish_reason = FinishReason::Complete;

            loop {
                let (events, finished) = match stream.next().await {
                    Some(Ok(chunk)) => {
                        pending.extend_from_slice(&chunk);
                        buffer.push_str(&take_utf8(&mut pending));
                        (drain_events(&mut buffer), false)
                    }
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(ProviderError::NetworkError(e.without_url().to_string())))
                            .await;
                        return;
                    }
                    None => {
                        buffer.push_str(&String::from_utf8_lossy(&pending));
                        pending.clear();
                        // The last event may lack its blank-line terminator.
                        buffer.push_str("\n\n");
                        (drain_events(&mut buffer), true)
                    }
                };

                for data in events {
                    let response = match serde_json::from_str::<GenerateContentResponse>(&data) {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(error = %e, "Unparsable stream event");
                            let _ = tx
                                .send(Err(ProviderError::ApiError(format!(
                                    "Failed to parse stream event: {}",
                                    e
                                ))))
                                .await;
                            return;
                        }
                    };

                    if let Some(error) = &response.error {
                        tracing::error!(
                            code = ?error.code,
                            status = ?error.status,
                            "Gemini reported an error mid-stream"
                        );
                        let _ = tx.send(Err(error.to_provider_error())).await;
                        return;
                    }

                    if let Some(usage) = &response.usage_metadata {
                        input_tokens = usage.prompt_token_count.unwrap_or(input_tokens);
                        output_tokens = usage.candidates_token_count.unwrap_or(output_tokens);
                    }
                    if response.is_blocked() {
                        finish_reason = FinishReason::ContentFilter;
                    }
                    if let Some(reason) = response.finish_reason() {
                        finish_reason = reason;
                    }

                    let text = response.text();
                    if !text.is_empty() && tx.send(Ok(StreamChunk::Text(text))).await.is_err() {
                        return;
                    }
                }

                if finished {
                    break;
                }
            }

            let _ = tx
                .send(Ok(StreamChunk::Complete {
                    input_tokens,
                    output_tokens,
                    finish_reason,
                }))
                .await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)) as ProviderStream)
    }

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<RemoteFile, ProviderError> {
        let started = Instant::now();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::FileError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            mime_type = %mime_type,
            size = data.len(),
            "Uploading file to Gemini"
        );

        let result = self.upload_bytes(data, mime_type, display_name).await;
        record_call("upload_file", started, result.is_ok());

        if let Ok(file) = &result {
            tracing::info!(file = %file.name, mime_type = %file.mime_type, "Uploaded file to Gemini");
        }
        result
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1beta/models/{}", self.base(), self.config.model);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.without_url().to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

/// Map a non-success status to a provider error, consuming the body for the message.
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimited);
    }

    Err(ProviderError::ApiError(format!(
        "Gemini API error {}: {}",
        status, error_text
    )))
}

fn record_call(operation: &'static str, started: Instant, ok: bool) {
    let outcome = if ok { "success" } else { "error" };
    counter!("gemini_requests_total", "operation" => operation, "outcome" => outcome).increment(1);
    histogram!("gemini_request_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// Decode the bytes of `pending` that form complete code points.
///
/// Invalid sequences become U+FFFD; a code point split at the end stays in `pending`.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    let mut text = String::new();

    loop {
        match std::str::from_utf8(pending) {
            Ok(valid) => {
                text.push_str(valid);
                pending.clear();
                return text;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + len);
                    }
                    None => {
                        pending.drain(..valid);
                        return text;
                    }
                }
            }
        }
    }
}

/// Remove every complete server-sent event from `buffer`, returning their `data` payloads.
fn drain_events(buffer: &mut String) -> Vec<String> {
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }

    let mut events = Vec::new();
    while let Some(event_end) = buffer.find("\n\n") {
        let event: String = buffer.drain(..event_end + 2).collect();

        let data: Vec<&str> = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.strip_prefix(' ').unwrap_or(data))
            .collect();

        if !data.is_empty() {
            events.push(data.join("\n"));
        }
    }
    events
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

impl From<&Part> for RequestPart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => RequestPart::Text { text: text.clone() },
            Part::InlineData { mime_type, data } => RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                },
            },
            Part::FileData {
                mime_type,
                file_uri,
            } => RequestPart::FileData {
                file_data: FileData {
                    mime_type: mime_type.clone(),
                    file_uri: file_uri.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    /// Present when the API fails after the stream has started.
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, skipping thought parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought.unwrap_or(false))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .map(|reason| FinishReason::from_api(Some(reason)))
    }

    fn is_blocked(&self) -> bool {
        self.prompt_feedback
            .as_ref()
            .is_some_and(|f| f.block_reason.is_some())
    }

    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        if let Some(error) = &self.error {
            return Err(error.to_provider_error());
        }

        let finish_reason = self.finish_reason().unwrap_or(FinishReason::Complete);
        if self.is_blocked() || finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let usage = self.usage_metadata.as_ref();
        Ok(ProviderResponse {
            text: self.text(),
            input_tokens: usage.and_then(|u| u.prompt_token_count).unwrap_or(0),
            output_tokens: usage.and_then(|u| u.candidates_token_count).unwrap_or(0),
            finish_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiErrorBody {
    fn to_provider_error(&self) -> ProviderError {
        if self.code == Some(429) || self.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
            return ProviderError::RateLimited;
        }
        ProviderError::ApiError(format!(
            "Gemini API error {}: {}",
            self.status.as_deref().unwrap_or("UNKNOWN"),
            self.message
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadStartRequest {
    file: UploadFileMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#![allow(dead_code)]

use multimodal_service::config::{GeminiSettings, MultimodalConfig, SwaggerSettings, UploadSettings};
use multimodal_service::services::providers::mock::{MockBehavior, MockProvider};
use multimodal_service::startup::Application;
use reqwest::multipart::{Form, Part};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";
pub const MP3_BYTES: &[u8] = b"ID3\x03\x00not-really-an-mp3";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockProvider>,
    pub upload_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration pointing uploads at `upload_dir`, on a random port.
pub fn test_config(upload_dir: &Path, swagger_enabled: bool) -> MultimodalConfig {
    MultimodalConfig {
        common: CoreConfig { port: 0 },
        gemini: GeminiSettings {
            api_key: Secret::new("test-api-key".to_string()),
            model: "gemini-2.5-flash".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
        },
        uploads: UploadSettings {
            temp_dir: Some(upload_dir.to_path_buf()),
            max_upload_bytes: 20 * 1024 * 1024,
        },
        swagger: SwaggerSettings {
            enabled: swagger_enabled,
        },
    }
}

impl TestApp {
    pub async fn spawn(behavior: MockBehavior) -> Self {
        Self::spawn_with(MockProvider::new(behavior), true).await
    }

    pub async fn spawn_with(provider: MockProvider, swagger_enabled: bool) -> Self {
        Self::spawn_configured(provider, |config| config.swagger.enabled = swagger_enabled).await
    }

    /// Spawn with the default test configuration adjusted by `configure`.
    pub async fn spawn_configured(
        provider: MockProvider,
        configure: impl FnOnce(&mut MultimodalConfig),
    ) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let provider = Arc::new(provider);

        let mut config = test_config(upload_dir.path(), true);
        configure(&mut config);

        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            provider,
            upload_dir,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, path: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Files currently left in the upload directory.
    pub fn upload_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .expect("Failed to read upload dir")
            .count()
    }
}

pub fn file_part(data: &[u8], file_name: &str, mime: &str) -> Part {
    Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("Invalid MIME type")
}

/// Status and parsed JSON body of a response.
pub async fn json_body(response: reqwest::Response) -> (u16, serde_json::Value) {
    let status = response.status().as_u16();
    let body = response.json().await.expect("Failed to parse JSON");
    (status, body)
}

use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

/// Default model served by the gateway.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default remote endpoint of the Generative Language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// 20 MiB, enough for a phone photo or a short voice memo.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct MultimodalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub uploads: UploadSettings,
    pub swagger: SwaggerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    /// Empty when `GEMINI_API_KEY` is unset; the provider reports it on first use.
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Directory for transient upload files. `None` means the system temp dir.
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerSettings {
    pub enabled: bool,
}

impl MultimodalConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(MultimodalConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: Secret::new(env::var("GEMINI_API_KEY").unwrap_or_default()),
                model: get_env("GEMINI_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_API_BASE), is_prod)?,
                timeout_secs: get_env_parsed("GEMINI_TIMEOUT_SECS", "120", is_prod)?,
            },
            uploads: UploadSettings {
                temp_dir: env::var("UPLOAD_TEMP_DIR").ok().map(PathBuf::from),
                max_upload_bytes: get_env_parsed(
                    "MAX_UPLOAD_BYTES",
                    &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
                    is_prod,
                )?,
            },
            swagger: SwaggerSettings {
                enabled: get_env_parsed("SWAGGER_ENABLED", "true", is_prod)?,
            },
        })
    }

    /// Directory uploads are buffered into.
    pub fn upload_dir(&self) -> PathBuf {
        self.uploads
            .temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }
}

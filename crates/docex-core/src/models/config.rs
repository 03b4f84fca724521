//! Configuration structures for the extraction pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docex_gateway::{ChatCompletionsBackend, GatewayError};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for docex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocexConfig {
    /// Language model backend configuration.
    pub llm: LlmConfig,

    /// Retry loop configuration.
    pub retry: RetryConfig,

    /// Image pre-processing configuration.
    pub image: ImageConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Language model backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// API key. Prefer `api_key_env` to keep secrets out of config files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature (provider default when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: docex_gateway::DEFAULT_BASE_URL.to_string(),
            model: docex_gateway::DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Build the HTTP backend described by this configuration.
    pub fn backend(&self) -> Result<ChatCompletionsBackend, GatewayError> {
        let mut builder = ChatCompletionsBackend::builder()
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_api_key_env(&self.api_key_env)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_temperature(self.temperature);

        if let Some(key) = &self.api_key {
            builder = builder.with_api_key(key);
        }

        builder.build()
    }
}

/// Retry loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum model round trips per document.
    pub max_attempts: usize,

    /// Base backoff delay in milliseconds. Attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,

    /// Append the previous attempt's error to the next prompt.
    pub feedback: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            feedback: false,
        }
    }
}

/// Image pre-processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Convert to grayscale before sending.
    pub grayscale: bool,

    /// Contrast enhancement factor (1.0 leaves the image unchanged).
    pub contrast: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            contrast: 3.0,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving batch output records.
    pub output_dir: PathBuf,

    /// Also write a per-file CSV summary next to the JSON record.
    pub summary_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            summary_csv: false,
        }
    }
}

impl DocexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.image.contrast > 0.0) {
            return Err(ConfigError::InvalidSetting {
                key: "image.contrast".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "llm.model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

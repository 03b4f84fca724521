//! OpenAI-compatible `/chat/completions` backend.
//!
//! Works against any provider exposing the OpenAI chat schema, including the
//! Gemini compatibility endpoint used by default.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, trace};

use super::ModelGateway;
use crate::{GatewayError, ImagePayload, Result};

/// Default OpenAI-compatible endpoint (Gemini).
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default vision-capable model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// HTTP client for OpenAI-compatible chat completion APIs.
#[derive(Clone)]
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

/// Builder for [`ChatCompletionsBackend`].
pub struct ChatCompletionsBuilder {
    base_url: String,
    api_key: Option<String>,
    api_key_env: Option<String>,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl ChatCompletionsBuilder {
    /// Create a builder pointing at the default endpoint and model.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            temperature: None,
        }
    }

    /// Set the API base URL (without the `/chat/completions` suffix).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key directly.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Read the API key from this environment variable when none was set directly.
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sampling temperature. Unset leaves the provider default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the backend.
    pub fn build(self) -> Result<ChatCompletionsBackend> {
        if self.model.trim().is_empty() {
            return Err(GatewayError::Config("model must not be empty".to_string()));
        }

        let api_key = match (self.api_key, &self.api_key_env) {
            (Some(key), _) if !key.is_empty() => key,
            (_, Some(var)) => std::env::var(var)
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| GatewayError::MissingApiKey(var.clone()))?,
            _ => return Err(GatewayError::MissingApiKey("an API key".to_string())),
        };

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(ChatCompletionsBackend {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: self.model,
            temperature: self.temperature,
        })
    }
}

impl Default for ChatCompletionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatCompletionsBackend {
    /// Start building a backend.
    pub fn builder() -> ChatCompletionsBuilder {
        ChatCompletionsBuilder::new()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ModelGateway for ChatCompletionsBackend {
    async fn invoke(&self, prompt: &str, image: Option<&ImagePayload>) -> Result<String> {
        let body = request_body(&self.model, prompt, image, self.temperature);

        debug!(
            "Sending prompt ({} chars, image: {}) to {}",
            prompt.chars().count(),
            image.is_some(),
            self.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        trace!(
            "Raw backend response: {}",
            text.chars().take(1000).collect::<String>()
        );
        parse_reply(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build the chat completion request body.
///
/// Without an image the user message content is the plain prompt string;
/// with one it becomes a `[text, image_url]` part list.
fn request_body(
    model: &str,
    prompt: &str,
    image: Option<&ImagePayload>,
    temperature: Option<f32>,
) -> Value {
    let content = match image {
        Some(image) => json!([
            {"type": "text", "text": prompt},
            {"type": "image_url", "image_url": {"url": image.to_data_url()}}
        ]),
        None => Value::String(prompt.to_string()),
    };

    let mut body = json!({
        "model": model,
        "messages": [
            {"role": "user", "content": content}
        ]
    });

    if let Some(temperature) = temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// Pull the first choice's message content out of a response body.
fn parse_reply(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(GatewayError::EmptyResponse)
}

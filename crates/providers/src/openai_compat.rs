//! OpenAI-compatible generation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, LM Studio, and any endpoint
//! exposing `/chat/completions`. Text payloads are sent as a single user
//! message; multimodal payloads add an `image_url` content part carrying the
//! image as a `data:` URL.

use async_trait::async_trait;
use docweave_config::ProviderConfig;
use docweave_core::error::GenerationError;
use docweave_core::generation::{GenerationMode, Generator, Payload};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible chat completion client.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout_secs: u64,
    vision: bool,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout_secs,
            vision: true,
            client,
        })
    }

    /// Build from the `[provider]` config section. `model` overrides the
    /// configured default (profiles pin their own model).
    pub fn from_config(
        config: &ProviderConfig,
        model: Option<&str>,
    ) -> Result<Self, GenerationError> {
        let mut generator = Self::new(
            "openai-compat",
            &config.base_url,
            model.unwrap_or(&config.model),
            config.timeout_secs,
        )?
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
        generator.api_key = config.api_key.clone();
        Ok(generator)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Declare whether the model accepts images.
    pub fn with_vision(mut self, vision: bool) -> Self {
        self.vision = vision;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_api_message(payload: &Payload) -> Result<ApiMessage, GenerationError> {
        let content = match (payload.mode, &payload.image) {
            (GenerationMode::Text, _) => ApiContent::Text(payload.text.clone()),
            (GenerationMode::Multimodal, Some(image)) => ApiContent::Parts(vec![
                ApiContentPart::Text {
                    text: payload.text.clone(),
                },
                ApiContentPart::ImageUrl {
                    image_url: ApiImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
            (GenerationMode::Multimodal, None) => {
                return Err(GenerationError::UnsupportedMode(
                    "multimodal payload without an image".into(),
                ));
            }
        };
        Ok(ApiMessage {
            role: "user".into(),
            content,
        })
    }

    fn request_body(&self, payload: &Payload) -> Result<serde_json::Value, GenerationError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [Self::to_api_message(payload)?],
            "temperature": self.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        Ok(body)
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_images(&self) -> bool {
        self.vision
    }

    async fn invoke(&self, payload: &Payload) -> Result<String, GenerationError> {
        if payload.mode == GenerationMode::Multimodal && !self.vision {
            return Err(GenerationError::UnsupportedMode(format!(
                "model '{}' does not accept images",
                self.model
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(payload)?;

        debug!(
            provider = %self.name,
            model = %self.model,
            mode = %payload.mode,
            chars = payload.text.len(),
            "Sending completion request"
        );

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                GenerationError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(GenerationError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(GenerationError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GenerationError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        if let Some(usage) = &api_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

// --- OpenAI API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Parts(Vec<ApiContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    Text { text: String },
    ImageUrl { image_url: ApiImageUrl },
}

#[derive(Debug, Serialize)]
struct ApiImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

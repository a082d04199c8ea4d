//! Google Gemini backend.
//!
//! Gemini takes a single prompt string, so the role-tagged history is
//! flattened into a `System:`/`Human:`/`Assistant:` transcript.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::adapters::llm::flatten_transcript;
use crate::domain::conversation::session::ChatMessage;
use crate::ports::llm_provider::{LlmError, LlmProvider, RawLlmResponse};

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<RawLlmResponse, LlmError> {
        let transcript = flatten_transcript(system_prompt, history);
        let request = WireRequest {
            contents: vec![WireContent {
                parts: vec![WirePart { text: transcript }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
        };

        debug!(model = %self.config.model, "gemini request");

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        seconds: self.config.timeout.as_secs(),
                    }
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AccessDenied(body),
                StatusCode::NOT_FOUND => LlmError::ModelNotFound(body),
                StatusCode::TOO_MANY_REQUESTS => LlmError::Throttled(body),
                s if s.is_server_error() => LlmError::Unavailable(body),
                s => LlmError::Network(format!("unexpected status {s}: {body}")),
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| LlmError::Parse("response carried no candidates".to_string()))?;

        Ok(RawLlmResponse::Text(text))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent {
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: WireCandidateContent,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

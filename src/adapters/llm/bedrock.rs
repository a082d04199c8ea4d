//! AWS Bedrock runtime backend (Llama 3 text completion).
//!
//! Talks to the Bedrock runtime HTTP endpoint with a bearer API key and
//! the flattened transcript prompt. Bedrock reports failures both through
//! HTTP status and a `__type` field in the body; both are inspected to
//! keep the error classification stable.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::adapters::llm::flatten_transcript;
use crate::domain::conversation::session::ChatMessage;
use crate::ports::llm_provider::{LlmError, LlmProvider, RawLlmResponse};

/// Configuration for the Bedrock backend.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    api_key: Secret<String>,
    pub model_id: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

impl BedrockConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model_id: "meta.llama3-70b-instruct-v1:0".to_string(),
            base_url: "https://bedrock-runtime.us-east-1.amazonaws.com".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
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

pub struct BedrockProvider {
    config: BedrockConfig,
    client: Client,
}

impl BedrockProvider {
    pub fn new(config: BedrockConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.config.base_url, self.config.model_id)
    }
}

/// Classifies a failure body by status and the `__type` marker Bedrock
/// embeds in error payloads.
fn classify_failure(status: StatusCode, body: String) -> LlmError {
    if body.contains("AccessDenied") {
        return LlmError::AccessDenied(body);
    }
    if body.contains("ResourceNotFound") {
        return LlmError::ModelNotFound(body);
    }
    if body.contains("Throttling") {
        return LlmError::Throttled(body);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AccessDenied(body),
        StatusCode::NOT_FOUND => LlmError::ModelNotFound(body),
        StatusCode::TOO_MANY_REQUESTS => LlmError::Throttled(body),
        s if s.is_server_error() => LlmError::Unavailable(body),
        s => LlmError::Network(format!("unexpected status {s}: {body}")),
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<RawLlmResponse, LlmError> {
        let request = WireRequest {
            prompt: flatten_transcript(system_prompt, history),
            max_gen_len: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model_id = %self.config.model_id, "bedrock invoke");

        let response = self
            .client
            .post(self.invoke_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
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
            return Err(classify_failure(status, body));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(RawLlmResponse::Text(parsed.generation))
    }

    fn name(&self) -> &str {
        "bedrock"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    prompt: String,
    max_gen_len: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    generation: String,
}

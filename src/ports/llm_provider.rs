//! Port for language model backends.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::conversation::response::NormalizedResponse;
use crate::domain::conversation::session::ChatMessage;

/// Errors from a language model backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("access to the language model was denied: {0}")]
    AccessDenied(String),

    #[error("language model not found: {0}")]
    ModelNotFound(String),

    #[error("language model throttled the request: {0}")]
    Throttled(String),

    #[error("network error talking to the language model: {0}")]
    Network(String),

    #[error("failed to parse language model response: {0}")]
    Parse(String),

    #[error("language model request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("language model service unavailable: {0}")]
    Unavailable(String),
}

impl LlmError {
    /// The message shown to the end user when a turn fails with this
    /// error. Never exposes backend detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            LlmError::AccessDenied(_) => {
                "I don't have permission to access the language model. Please check the configuration."
            }
            LlmError::ModelNotFound(_) => {
                "The requested language model was not found. Please check the model ID."
            }
            LlmError::Throttled(_) => {
                "The service is currently experiencing high traffic. Please try again in a moment."
            }
            _ => {
                "I'm sorry, but I'm having trouble connecting to my language processing service. Please try again later."
            }
        }
    }
}

/// One block of a multi-part provider reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentBlock {
    pub text: Option<String>,
    pub tool_call: Option<String>,
    pub tool_parameters: Vec<Value>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool(name: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            tool_call: Some(name.into()),
            tool_parameters: parameters,
            ..Self::default()
        }
    }
}

/// Provider output before normalization. Backends return whichever shape
/// is natural to them; the normalizer folds all three into one contract.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLlmResponse {
    /// The backend already produced the normalized contract.
    Normalized(NormalizedResponse),
    /// A multi-block payload (text interleaved with tool calls).
    Blocks(Vec<ContentBlock>),
    /// Free-form text, possibly containing embedded JSON.
    Text(String),
}

/// A language model backend able to answer one conversation turn.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a reply for the given system prompt and history. The
    /// final history entry is the user message being answered.
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<RawLlmResponse, LlmError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

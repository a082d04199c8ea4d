//! Language model backend adapters.
//!
//! Each adapter implements the [`LlmProvider`] port for one backend. The
//! engine never branches on provider identity; selection happens once at
//! startup via [`provider_from_config`].

pub mod bedrock;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use bedrock::{BedrockConfig, BedrockProvider};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::MockLlmProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};

use std::sync::Arc;

use crate::config::{LlmConfig, LlmProviderKind, ValidationError};
use crate::ports::llm_provider::LlmProvider;

/// Builds the configured backend. Assumes the config already validated,
/// so missing credentials surface as the same validation errors.
pub fn provider_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ValidationError> {
    match config.provider {
        LlmProviderKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or(ValidationError::MissingRequired("LLM_OPENAI_API_KEY"))?;
            Ok(Arc::new(OpenAiProvider::new(
                OpenAiConfig::new(api_key)
                    .with_model(&config.openai_model)
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature)
                    .with_timeout(config.timeout()),
            )))
        }
        LlmProviderKind::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or(ValidationError::MissingRequired("LLM_GEMINI_API_KEY"))?;
            Ok(Arc::new(GeminiProvider::new(
                GeminiConfig::new(api_key)
                    .with_model(&config.gemini_model)
                    .with_max_tokens(config.max_tokens)
                    .with_temperature(config.temperature)
                    .with_timeout(config.timeout()),
            )))
        }
        LlmProviderKind::Bedrock => {
            let api_key = config
                .bedrock_api_key
                .clone()
                .ok_or(ValidationError::MissingRequired("LLM_BEDROCK_API_KEY"))?;
            let mut bedrock = BedrockConfig::new(api_key)
                .with_model_id(&config.bedrock_model_id)
                .with_max_tokens(config.max_tokens)
                .with_temperature(config.temperature)
                .with_timeout(config.timeout());
            if let Some(base_url) = &config.bedrock_base_url {
                bedrock = bedrock.with_base_url(base_url);
            }
            Ok(Arc::new(BedrockProvider::new(bedrock)))
        }
        LlmProviderKind::Mock => Ok(Arc::new(MockLlmProvider::new())),
    }
}

/// Flattens a role-tagged history into a `System:`/`Human:`/`Assistant:`
/// transcript for backends that take a single prompt string.
pub(crate) fn flatten_transcript(
    system_prompt: &str,
    history: &[crate::domain::conversation::session::ChatMessage],
) -> String {
    use crate::domain::conversation::session::ChatRole;

    let mut transcript = format!("System: {system_prompt}\n\n");
    for message in history {
        let tag = match message.role {
            ChatRole::User => "Human",
            ChatRole::Assistant => "Assistant",
        };
        transcript.push_str(&format!("{tag}: {}\n\n", message.content));
    }
    transcript.push_str("Assistant:");
    transcript
}

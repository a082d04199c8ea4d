//! Language model provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Language model configuration
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    /// Which backend answers conversation turns
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Gemini API key
    pub gemini_api_key: Option<Secret<String>>,

    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Bedrock API key / bearer token
    pub bedrock_api_key: Option<Secret<String>>,

    /// Bedrock runtime endpoint
    pub bedrock_base_url: Option<String>,

    /// Bedrock model id
    #[serde(default = "default_bedrock_model")]
    pub bedrock_model_id: String,

    /// Completion token cap per turn
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Supported language model backends
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    OpenAi,
    Gemini,
    Bedrock,
    Mock,
}

impl LlmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate language model configuration
    ///
    /// The selected provider must carry its credentials; the mock backend
    /// needs none.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            LlmProviderKind::OpenAi if self.openai_api_key.is_none() => {
                return Err(ValidationError::MissingRequired("LLM_OPENAI_API_KEY"));
            }
            LlmProviderKind::Gemini if self.gemini_api_key.is_none() => {
                return Err(ValidationError::MissingRequired("LLM_GEMINI_API_KEY"));
            }
            LlmProviderKind::Bedrock if self.bedrock_api_key.is_none() => {
                return Err(ValidationError::MissingRequired("LLM_BEDROCK_API_KEY"));
            }
            _ => {}
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            bedrock_api_key: None,
            bedrock_base_url: None,
            bedrock_model_id: default_bedrock_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_bedrock_model() -> String {
    "meta.llama3-70b-instruct-v1:0".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProviderKind::OpenAi);
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_selected_provider_requires_key() {
        let config = LlmConfig::default();
        assert!(config.validate().is_err());

        let config = LlmConfig {
            openai_api_key: Some(Secret::new("sk-xxx".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_temperature_bounds() {
        let config = LlmConfig {
            provider: LlmProviderKind::Mock,
            temperature: 2.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTemperature)
        ));
    }
}

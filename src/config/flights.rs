//! Flight search provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Flight search configuration
#[derive(Debug, Deserialize)]
pub struct FlightsConfig {
    /// Which backend serves offer searches
    #[serde(default)]
    pub provider: FlightProviderKind,

    /// Amadeus API client id
    pub amadeus_client_id: Option<String>,

    /// Amadeus API client secret
    pub amadeus_client_secret: Option<Secret<String>>,

    /// Amadeus endpoint
    #[serde(default = "default_base_url")]
    pub amadeus_base_url: String,

    /// Default pricing currency (3-letter ISO code)
    #[serde(default = "default_currency")]
    pub currency_code: String,

    /// Default result cap per search (1-10)
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Retry attempts beyond the first try
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in seconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: f64,

    /// Backoff multiplier applied after each failed attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Add up to 25% random jitter to each delay
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

/// Supported flight search backends
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlightProviderKind {
    #[default]
    Amadeus,
    Mock,
}

impl FlightsConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.initial_delay_secs)
    }

    /// Validate flight search configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == FlightProviderKind::Amadeus {
            if self.amadeus_client_id.is_none() {
                return Err(ValidationError::MissingRequired(
                    "FLIGHTS_AMADEUS_CLIENT_ID",
                ));
            }
            if self.amadeus_client_secret.is_none() {
                return Err(ValidationError::MissingRequired(
                    "FLIGHTS_AMADEUS_CLIENT_SECRET",
                ));
            }
        }
        if self.max_results < 1 || self.max_results > 10 {
            return Err(ValidationError::InvalidMaxResults);
        }
        if self.backoff_factor < 1.0 {
            return Err(ValidationError::InvalidBackoffFactor);
        }
        Ok(())
    }
}

impl Default for FlightsConfig {
    fn default() -> Self {
        Self {
            provider: FlightProviderKind::default(),
            amadeus_client_id: None,
            amadeus_client_secret: None,
            amadeus_base_url: default_base_url(),
            currency_code: default_currency(),
            max_results: default_max_results(),
            max_retries: default_max_retries(),
            initial_delay_secs: default_initial_delay(),
            backoff_factor: default_backoff_factor(),
            jitter: default_jitter(),
        }
    }
}

fn default_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_max_results() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay() -> f64 {
    1.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flights_config_defaults() {
        let config = FlightsConfig::default();
        assert_eq!(config.currency_code, "INR");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay(), Duration::from_secs(1));
        assert_eq!(config.backoff_factor, 2.0);
        assert!(config.jitter);
    }

    #[test]
    fn test_amadeus_requires_credentials() {
        let config = FlightsConfig::default();
        assert!(config.validate().is_err());

        let config = FlightsConfig {
            amadeus_client_id: Some("id".to_string()),
            amadeus_client_secret: Some(Secret::new("secret".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mock_needs_no_credentials() {
        let config = FlightsConfig {
            provider: FlightProviderKind::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_results_bounds() {
        let config = FlightsConfig {
            provider: FlightProviderKind::Mock,
            max_results: 11,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMaxResults)
        ));
    }
}

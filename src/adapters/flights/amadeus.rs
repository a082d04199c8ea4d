//! Amadeus flight-offers backend.
//!
//! Authenticates with the client-credentials flow and caches the bearer
//! token until shortly before expiry. Offer searches go to the
//! `flight-offers` endpoint with the wire parameters as query arguments.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::flights::offer::FlightOffer;
use crate::ports::flight_provider::{
    FlightProvider, FlightProviderError, OfferSearchParams, OffersPage,
};

/// Renew the token this long before it actually expires.
const TOKEN_RENEWAL_MARGIN: Duration = Duration::from_secs(60);

/// Configuration for the Amadeus backend.
#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    client_id: String,
    client_secret: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl AmadeusConfig {
    pub fn new(client_id: impl Into<String>, client_secret: Secret<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            base_url: "https://test.api.amadeus.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

struct CachedToken {
    access_token: String,
    renew_after: Instant,
}

pub struct AmadeusProvider {
    config: AmadeusConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusProvider {
    pub fn new(config: AmadeusConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            config,
            client,
            token: Mutex::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/v1/security/oauth2/token", self.config.base_url)
    }

    fn offers_url(&self) -> String {
        format!("{}/v2/shopping/flight-offers", self.config.base_url)
    }

    /// Returns a valid bearer token, fetching a fresh one when the cached
    /// token is absent or close to expiry.
    async fn bearer_token(&self) -> Result<String, FlightProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.renew_after {
                return Ok(token.access_token.clone());
            }
        }

        debug!("fetching new amadeus access token");
        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| FlightProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlightProviderError::Response {
                status: status.as_u16(),
                message: format!("token request failed: {body}"),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FlightProviderError::Decode(e.to_string()))?;
        let renew_after = Instant::now()
            + Duration::from_secs(token.expires_in).saturating_sub(TOKEN_RENEWAL_MARGIN);
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            renew_after,
        });
        Ok(access_token)
    }
}

#[async_trait]
impl FlightProvider for AmadeusProvider {
    async fn search_offers(
        &self,
        params: &OfferSearchParams,
    ) -> Result<OffersPage, FlightProviderError> {
        let token = self.bearer_token().await?;

        let response = self
            .client
            .get(self.offers_url())
            .bearer_auth(token)
            .query(params)
            .send()
            .await
            .map_err(|e| FlightProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_detail(&body).unwrap_or(body);
            return Err(FlightProviderError::Response {
                status: status.as_u16(),
                message,
            });
        }

        let page: WireOffersPage = response
            .json()
            .await
            .map_err(|e| FlightProviderError::Decode(e.to_string()))?;

        Ok(OffersPage {
            offers: page.data,
            meta: page.meta,
        })
    }

    fn name(&self) -> &str {
        "amadeus"
    }
}

/// Pulls the first error title/detail out of an Amadeus failure payload.
fn extract_error_detail(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = parsed.get("errors")?.as_array()?.first()?;
    let title = error.get("title").and_then(Value::as_str).unwrap_or_default();
    let detail = error.get("detail").and_then(Value::as_str).unwrap_or_default();
    if title.is_empty() && detail.is_empty() {
        None
    } else if detail.is_empty() {
        Some(title.to_string())
    } else {
        Some(format!("{title}: {detail}"))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct WireOffersPage {
    #[serde(default)]
    data: Vec<FlightOffer>,
    #[serde(default)]
    meta: Option<Value>,
}

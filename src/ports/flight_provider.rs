//! Port for flight offer search backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::flights::offer::FlightOffer;

/// Errors from a flight search backend.
///
/// Only `Response` errors are retryable: the backend accepted the request
/// and answered with a failure, which may be transient. Transport and
/// decode failures abort immediately.
#[derive(Debug, Error)]
pub enum FlightProviderError {
    #[error("flight provider responded with status {status}: {message}")]
    Response { status: u16, message: String },

    #[error("transport error reaching flight provider: {0}")]
    Transport(String),

    #[error("failed to decode flight provider response: {0}")]
    Decode(String),
}

impl FlightProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlightProviderError::Response { .. })
    }
}

/// Wire-shape search parameters, keyed the way the upstream offer search
/// API expects them. Optional keys are omitted entirely when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSearchParams {
    pub currency_code: String,
    pub origin_location_code: String,
    pub destination_location_code: String,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub adults: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_airline_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_stop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    pub max: u32,
}

/// One page of offers plus whatever metadata the backend attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OffersPage {
    pub offers: Vec<FlightOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A flight search backend able to list offers for a route.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    async fn search_offers(
        &self,
        params: &OfferSearchParams,
    ) -> Result<OffersPage, FlightProviderError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_optionals_are_omitted_from_wire_form() {
        let params = OfferSearchParams {
            currency_code: "INR".into(),
            origin_location_code: "SFO".into(),
            destination_location_code: "JFK".into(),
            departure_date: "2025-07-20".into(),
            adults: 1,
            max: 5,
            ..OfferSearchParams::default()
        };

        let wire = serde_json::to_value(&params).unwrap();
        let object = wire.as_object().unwrap();
        assert_eq!(object["currencyCode"], "INR");
        assert_eq!(object["originLocationCode"], "SFO");
        assert!(!object.contains_key("returnDate"));
        assert!(!object.contains_key("children"));
        assert!(!object.contains_key("nonStop"));
        assert!(!object.contains_key("maxPrice"));
    }

    #[test]
    fn only_response_errors_are_retryable() {
        assert!(FlightProviderError::Response {
            status: 500,
            message: "server error".into()
        }
        .is_retryable());
        assert!(!FlightProviderError::Transport("refused".into()).is_retryable());
        assert!(!FlightProviderError::Decode("bad json".into()).is_retryable());
    }
}

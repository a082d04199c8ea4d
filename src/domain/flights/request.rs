//! Flight search request validation and wire-parameter construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::dates;
use crate::ports::flight_provider::OfferSearchParams;

/// Result-set cap when neither the request nor the client sets one.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Recognized cabin classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }

    /// Case-insensitive parse of the four recognized classes.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ECONOMY" => Some(TravelClass::Economy),
            "PREMIUM_ECONOMY" => Some(TravelClass::PremiumEconomy),
            "BUSINESS" => Some(TravelClass::Business),
            "FIRST" => Some(TravelClass::First),
            _ => None,
        }
    }
}

/// Why a request was rejected before reaching the provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("{field} must be a 3-letter uppercase IATA code, got: {code}")]
    InvalidAirportCode { field: &'static str, code: String },

    #[error("Number of adults must be between 1 and 9")]
    AdultsOutOfRange,

    #[error("Number of children must be between 0 and 8")]
    ChildrenOutOfRange,

    #[error("Number of infants must be between 0 and 5")]
    InfantsOutOfRange,

    #[error("Total number of passengers cannot exceed 9")]
    TooManyPassengers,

    #[error("Number of infants cannot exceed number of adults")]
    InfantsExceedAdults,

    #[error("Travel class must be one of ECONOMY, PREMIUM_ECONOMY, BUSINESS, FIRST, got: {0}")]
    InvalidTravelClass(String),

    #[error("Currency code must be a 3-letter uppercase ISO code, got: {0}")]
    InvalidCurrencyCode(String),

    #[error("{field} must be a valid date in YYYY-MM-DD format, got: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Return date cannot be before departure date")]
    ReturnBeforeDeparture,
}

/// A flight search as requested by the conversation, before validation.
///
/// Field names match the payload the model is asked to produce for the
/// search tool, so the struct deserializes straight from tool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub travel_class: String,
    pub currency_code: String,
    /// `None` means the caller did not ask for a particular cap and the
    /// search client may substitute its configured one.
    pub max_results: Option<u32>,
    pub include_business_class: Option<bool>,
    pub include_premium_economy: Option<bool>,
    pub non_stop: bool,
    pub max_price: Option<f64>,
}

impl Default for FlightSearchRequest {
    fn default() -> Self {
        Self {
            origin: String::new(),
            destination: String::new(),
            departure_date: String::new(),
            return_date: None,
            adults: 1,
            children: 0,
            infants: 0,
            travel_class: "ECONOMY".to_string(),
            currency_code: "INR".to_string(),
            max_results: None,
            include_business_class: None,
            include_premium_economy: None,
            non_stop: false,
            max_price: None,
        }
    }
}

impl FlightSearchRequest {
    /// A one-way economy request with everything else defaulted.
    pub fn one_way(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date: departure_date.into(),
            ..Self::default()
        }
    }

    /// Checks every field; nothing is corrected silently. The first
    /// failing rule is reported.
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        validate_airport_code("origin", &self.origin)?;
        validate_airport_code("destination", &self.destination)?;

        if self.adults < 1 || self.adults > 9 {
            return Err(RequestValidationError::AdultsOutOfRange);
        }
        if self.children > 8 {
            return Err(RequestValidationError::ChildrenOutOfRange);
        }
        if self.infants > 5 {
            return Err(RequestValidationError::InfantsOutOfRange);
        }
        if self.adults + self.children + self.infants > 9 {
            return Err(RequestValidationError::TooManyPassengers);
        }
        if self.infants > self.adults {
            return Err(RequestValidationError::InfantsExceedAdults);
        }

        if TravelClass::parse(&self.travel_class).is_none() {
            return Err(RequestValidationError::InvalidTravelClass(
                self.travel_class.clone(),
            ));
        }

        if !is_valid_code(&self.currency_code) {
            return Err(RequestValidationError::InvalidCurrencyCode(
                self.currency_code.clone(),
            ));
        }

        if !dates::is_valid_date(&self.departure_date) {
            return Err(RequestValidationError::InvalidDate {
                field: "departure_date",
                value: self.departure_date.clone(),
            });
        }
        if let Some(return_date) = &self.return_date {
            if !dates::is_valid_date(return_date) {
                return Err(RequestValidationError::InvalidDate {
                    field: "return_date",
                    value: return_date.clone(),
                });
            }
            // Dates are strict YYYY-MM-DD at this point, string order is
            // chronological order.
            if return_date.as_str() < self.departure_date.as_str() {
                return Err(RequestValidationError::ReturnBeforeDeparture);
            }
        }

        Ok(())
    }

    /// Builds the provider parameter set from an already validated
    /// request. `children`/`infants` are omitted entirely when zero, the
    /// cabin-exclusion flags only translate when explicitly false, and a
    /// fractional max price truncates to an integer ceiling.
    pub fn to_params(&self) -> OfferSearchParams {
        let mut excluded_codes = String::new();
        if self.include_business_class == Some(false) {
            excluded_codes.push_str("!O");
        }
        if self.include_premium_economy == Some(false) {
            excluded_codes.push_str("!P");
        }

        OfferSearchParams {
            currency_code: self.currency_code.clone(),
            origin_location_code: self.origin.clone(),
            destination_location_code: self.destination.clone(),
            departure_date: self.departure_date.clone(),
            return_date: self.return_date.clone(),
            adults: self.adults,
            children: (self.children > 0).then_some(self.children),
            infants: (self.infants > 0).then_some(self.infants),
            travel_class: None,
            included_airline_codes: (!excluded_codes.is_empty()).then_some(excluded_codes),
            non_stop: self.non_stop.then_some(true),
            max_price: self.max_price.map(|price| price as i64),
            max: self.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }
}

fn validate_airport_code(
    field: &'static str,
    code: &str,
) -> Result<(), RequestValidationError> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(RequestValidationError::InvalidAirportCode {
            field,
            code: code.to_string(),
        })
    }
}

/// Exactly three uppercase ASCII letters.
fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

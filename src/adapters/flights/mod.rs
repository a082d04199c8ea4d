//! Flight search backend adapters.

pub mod amadeus;
pub mod mock;

pub use amadeus::{AmadeusConfig, AmadeusProvider};
pub use mock::MockFlightProvider;

use std::sync::Arc;

use crate::config::{FlightProviderKind, FlightsConfig, ValidationError};
use crate::ports::flight_provider::FlightProvider;

/// Builds the configured flight search backend.
pub fn provider_from_config(
    config: &FlightsConfig,
) -> Result<Arc<dyn FlightProvider>, ValidationError> {
    match config.provider {
        FlightProviderKind::Amadeus => {
            let client_id = config
                .amadeus_client_id
                .clone()
                .ok_or(ValidationError::MissingRequired("FLIGHTS_AMADEUS_CLIENT_ID"))?;
            let client_secret = config.amadeus_client_secret.clone().ok_or(
                ValidationError::MissingRequired("FLIGHTS_AMADEUS_CLIENT_SECRET"),
            )?;
            Ok(Arc::new(AmadeusProvider::new(
                AmadeusConfig::new(client_id, client_secret)
                    .with_base_url(&config.amadeus_base_url),
            )))
        }
        FlightProviderKind::Mock => Ok(Arc::new(MockFlightProvider::new())),
    }
}

//! Flight search domain: request validation, offer modelling, and the
//! retrying search client.

pub mod offer;
pub mod request;
pub mod search;

pub use offer::{FlightOffer, SortKey};
pub use request::{FlightSearchRequest, RequestValidationError, TravelClass};
pub use search::{FlightSearchClient, FlightSearchError, RetryPolicy};

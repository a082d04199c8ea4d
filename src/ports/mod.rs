//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `LlmProvider` - Port for language model backends
//! - `FlightProvider` - Port for flight offer search backends
//! - `SessionStore` - Port for conversation session persistence

pub mod flight_provider;
pub mod llm_provider;
pub mod session_store;

pub use flight_provider::{FlightProvider, FlightProviderError, OfferSearchParams, OffersPage};
pub use llm_provider::{ContentBlock, LlmError, LlmProvider, RawLlmResponse};
pub use session_store::{SessionStore, SessionStoreError};

//! Domain layer - core trip planning logic.
//!
//! Pure business logic with no knowledge of HTTP, storage, or concrete
//! model backends. Adapters plug in through the ports layer.
//!
//! - `conversation` - step flow, response normalization, turn engine
//! - `flights` - search request validation, retrying client, ordering
//! - `dates` - natural-language date normalization
//! - `booking` - trip cost estimation

pub mod booking;
pub mod conversation;
pub mod dates;
pub mod flights;

//! HTTP adapters - REST API implementations.

pub mod chat;
pub mod router;

pub use chat::ChatAppState;
pub use router::app_router;

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `llm` - Language model providers (OpenAI, Gemini, Bedrock, mock)
//! - `flights` - Flight offer providers (Amadeus, mock)
//! - `storage` - Session persistence
//! - `http` - Axum HTTP transport

pub mod flights;
pub mod http;
pub mod llm;
pub mod storage;

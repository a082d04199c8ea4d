//! Application layer - coordinates the conversation engine, session
//! persistence, and the caller-facing turn contract.

pub mod chat;

pub use chat::{ChatError, ChatService, TurnReply};

//! Conversation flow: steps, sessions, prompts, normalization, and the
//! turn engine that ties them together.

pub mod engine;
pub mod normalizer;
pub mod prompts;
pub mod response;
pub mod session;
pub mod step;

pub use engine::{ConversationEngine, TurnOutcome};
pub use normalizer::ResponseNormalizer;
pub use response::NormalizedResponse;
pub use session::{ChatMessage, ChatRole, CollectedData, ConversationSession};
pub use step::ConversationStep;

//! Mock language model backend for tests and offline development.
//!
//! Plays back scripted responses when given any, otherwise answers with a
//! canned reply matched to the instruction block it finds in the system
//! prompt. Every call is recorded for assertions.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::conversation::response::NormalizedResponse;
use crate::domain::conversation::session::ChatMessage;
use crate::ports::llm_provider::{LlmError, LlmProvider, RawLlmResponse};

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub history_len: usize,
}

#[derive(Default)]
pub struct MockLlmProvider {
    scripted: Mutex<Vec<RawLlmResponse>>,
    fail_with: Mutex<Option<LlmError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues responses returned in order before canned replies kick in.
    pub fn with_responses(responses: Vec<RawLlmResponse>) -> Self {
        Self {
            scripted: Mutex::new(responses),
            ..Self::default()
        }
    }

    /// Makes the next call fail once with the given error.
    pub fn fail_next(&self, error: LlmError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Canned reply for the instruction block present in the prompt.
    fn canned_reply(system_prompt: &str) -> NormalizedResponse {
        if system_prompt.contains("Greet the user") {
            let mut reply = NormalizedResponse::message(
                "Hello! I'm TripBot, your trip planning assistant.",
            );
            reply.question = "Where would you like to travel?".to_string();
            return reply;
        }
        if system_prompt.contains("gathering flight details") {
            return NormalizedResponse::question(
                "Which city will you be departing from, and on what date?",
            );
        }
        if system_prompt.contains("full name") {
            return NormalizedResponse::question(
                "Could you tell me your full name for the booking?",
            );
        }
        if system_prompt.contains("email address") {
            return NormalizedResponse::question(
                "What email address should I send the itinerary to?",
            );
        }
        NormalizedResponse::message("Understood.")
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<RawLlmResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            history_len: history.len(),
        });

        if let Some(error) = self.fail_with.lock().unwrap().take() {
            return Err(error);
        }

        let mut scripted = self.scripted.lock().unwrap();
        if !scripted.is_empty() {
            return Ok(scripted.remove(0));
        }

        Ok(RawLlmResponse::Normalized(Self::canned_reply(system_prompt)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

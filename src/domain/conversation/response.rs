//! The normalized assistant response contract.
//!
//! Whatever shape a provider returns, the engine hands back exactly one of
//! these: a statement, an optional question, extracted trip data, and an
//! optional tool invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider-agnostic assistant reply.
///
/// All fields default so that any subset of keys parses. Unknown keys in
/// provider output are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedResponse {
    /// Statement content shown to the user.
    pub message: String,
    /// A single question prompting the user's next input.
    pub question: String,
    /// Trip fields the model extracted this turn.
    pub user_data: Map<String, Value>,
    /// Name of the tool the model asked to invoke, empty when none.
    pub tool_call: String,
    /// Positional arguments for the tool call.
    pub tool_parameters: Vec<Value>,
}

impl NormalizedResponse {
    /// A response carrying only a statement.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            ..Self::default()
        }
    }

    /// A response carrying only a question.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            question: text.into(),
            ..Self::default()
        }
    }

    /// True when the model requested a tool invocation.
    pub fn wants_tool(&self) -> bool {
        !self.tool_call.trim().is_empty()
    }

    /// The text a history formatter should prefer: the question when
    /// present, otherwise the message.
    pub fn display_text(&self) -> &str {
        if !self.question.trim().is_empty() {
            &self.question
        } else {
            &self.message
        }
    }

    /// Copies every non-empty field of `other` over the corresponding
    /// field of `self`. Used when a provider splits its reply across
    /// multiple content blocks; the last non-empty value wins.
    pub fn absorb(&mut self, other: NormalizedResponse) {
        if !other.message.trim().is_empty() {
            self.message = other.message;
        }
        if !other.question.trim().is_empty() {
            self.question = other.question;
        }
        if !other.user_data.is_empty() {
            self.user_data = other.user_data;
        }
        if !other.tool_call.trim().is_empty() {
            self.tool_call = other.tool_call;
        }
        if !other.tool_parameters.is_empty() {
            self.tool_parameters = other.tool_parameters;
        }
    }
}

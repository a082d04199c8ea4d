//! Response normalization.
//!
//! Providers are asked for JSON but frequently return prose, JSON wrapped
//! in prose, or multi-block payloads. The normalizer folds any of those
//! into a single [`NormalizedResponse`] through a fallback chain:
//!
//! 1. parse the whole text as a JSON object;
//! 2. parse the substring between the first `{` and the last `}`;
//! 3. treat the text as plain prose, routed to `question` when it reads
//!    like one and to `message` otherwise.

use serde_json::Value;
use tracing::debug;

use crate::domain::conversation::response::NormalizedResponse;
use crate::ports::llm_provider::{ContentBlock, RawLlmResponse};

/// Phrases that mark otherwise unpunctuated prose as a question.
const QUESTION_MARKERS: [&str; 7] = [
    "could you",
    "would you",
    "can you",
    "please tell",
    "what is",
    "when is",
    "where is",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Collapses a raw provider payload into the normalized contract.
    pub fn normalize(&self, raw: RawLlmResponse) -> NormalizedResponse {
        match raw {
            RawLlmResponse::Normalized(response) => promote_question(response),
            RawLlmResponse::Text(text) => self.normalize_text(&text),
            RawLlmResponse::Blocks(blocks) => self.normalize_blocks(blocks),
        }
    }

    /// Runs the three-stage fallback chain over a single text payload.
    pub fn normalize_text(&self, raw: &str) -> NormalizedResponse {
        if let Ok(Value::Object(_)) = serde_json::from_str::<Value>(raw) {
            if let Ok(response) = serde_json::from_str::<NormalizedResponse>(raw) {
                return promote_question(response);
            }
        }

        if let Some(response) = self.parse_embedded_json(raw) {
            return response;
        }

        debug!("response was not JSON, treating as plain text");
        let trimmed = raw.trim();
        if looks_like_question(trimmed) {
            NormalizedResponse::question(trimmed)
        } else {
            NormalizedResponse::message(trimmed)
        }
    }

    /// Merges a multi-block payload, later non-empty fields winning.
    /// Tool-call blocks keep their call name and parameters; text blocks
    /// go through the text chain.
    fn normalize_blocks(&self, blocks: Vec<ContentBlock>) -> NormalizedResponse {
        let mut merged = NormalizedResponse::default();
        for block in blocks {
            if let Some(text) = block.text {
                merged.absorb(self.normalize_text(&text));
            }
            if let Some(tool_call) = block.tool_call {
                merged.absorb(NormalizedResponse {
                    tool_call,
                    tool_parameters: block.tool_parameters,
                    ..NormalizedResponse::default()
                });
            }
        }
        merged
    }

    /// Stage two: JSON wrapped in prose. Any text around the braces
    /// becomes the message when the parsed object carried none.
    fn parse_embedded_json(&self, raw: &str) -> Option<NormalizedResponse> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end <= start {
            return None;
        }

        let candidate = &raw[start..=end];
        let mut response = serde_json::from_str::<NormalizedResponse>(candidate).ok()?;

        if response.message.trim().is_empty() {
            let prefix = raw[..start].trim();
            let suffix = raw[end + 1..].trim();
            let commentary = [prefix, suffix]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            if !commentary.is_empty() {
                response.message = commentary;
            }
        }
        Some(promote_question(response))
    }
}

/// Moves an interrogative message into the question slot when the
/// question slot is empty, so callers can rely on question-bearing
/// replies landing in one place.
fn promote_question(mut response: NormalizedResponse) -> NormalizedResponse {
    if response.question.trim().is_empty() && looks_like_question(&response.message) {
        response.question = std::mem::take(&mut response.message);
    }
    response
}

fn looks_like_question(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    let lowered = text.to_lowercase();
    QUESTION_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

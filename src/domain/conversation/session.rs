//! Conversation session state.
//!
//! A session owns the step counter, the append-only message history, and
//! the collected trip data. Persistence is the caller's responsibility;
//! the engine only reads and returns updated copies.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::conversation::step::ConversationStep;
use crate::domain::dates::DateNormalizer;

/// Field name that is always refreshed on a successful merge.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Trip data fields collected over the conversation, in collection order.
pub const COLLECTED_FIELDS: [&str; 11] = [
    TIMESTAMP_FIELD,
    "traveler_name",
    "email",
    "destination",
    "departure_location",
    "departure_date",
    "return_date",
    "travelers_count",
    "trip_type",
    "budget",
    "preferences",
];

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Trip parameters accumulated across turns.
///
/// Values are strings except `preferences`, which is a nested object. The
/// merge rule is at-most-once-fill: a field holding a non-empty value is
/// never overwritten by a later empty/null delta value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectedData(Map<String, Value>);

impl CollectedData {
    /// Creates an empty data map with all known fields blank and a fresh
    /// timestamp.
    pub fn new() -> Self {
        let mut map = Map::new();
        for field in COLLECTED_FIELDS {
            if field == "preferences" {
                map.insert(field.to_string(), Value::Object(Map::new()));
            } else {
                map.insert(field.to_string(), Value::String(String::new()));
            }
        }
        map.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Self(map)
    }

    /// Wraps an existing map (e.g. loaded from storage).
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Read access to the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the string value of a field, if present and non-empty.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        match self.0.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// True when every field except the timestamp is empty.
    pub fn is_blank(&self) -> bool {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != TIMESTAMP_FIELD)
            .all(|(_, value)| is_empty_value(value))
    }

    /// True when the fields required to run a flight search are all
    /// non-empty.
    pub fn has_flight_search_fields(&self) -> bool {
        ["destination", "departure_location", "departure_date"]
            .iter()
            .all(|field| self.get_str(field).is_some())
    }

    /// Merges a delta of extracted fields into the collected data.
    ///
    /// Rules:
    /// - null values and empty/whitespace strings are skipped;
    /// - a field only updates when its current value is missing or empty;
    /// - field names containing "date" are normalized to `YYYY-MM-DD`;
    /// - the timestamp refreshes to now on every non-empty merge.
    ///
    /// Returns true when the delta carried at least one usable value.
    pub fn merge(&mut self, delta: &Map<String, Value>, dates: &DateNormalizer) -> bool {
        let mut touched = false;

        for (key, value) in delta {
            if key == TIMESTAMP_FIELD {
                continue;
            }
            if value.is_null() {
                continue;
            }

            let incoming = match value {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    Value::String(trimmed.to_string())
                }
                other => other.clone(),
            };

            let current_empty = self.0.get(key).map(is_empty_value).unwrap_or(true);
            if !current_empty {
                continue;
            }

            let stored = if key.to_lowercase().contains("date") {
                match &incoming {
                    Value::String(s) => Value::String(dates.normalize(s)),
                    other => other.clone(),
                }
            } else {
                incoming
            };

            self.0.insert(key.clone(), stored);
            touched = true;
        }

        if touched {
            self.0.insert(
                TIMESTAMP_FIELD.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        touched
    }
}

/// Treats null, empty/whitespace strings, and empty containers as empty.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// A persisted conversation, mutated only by the turn pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Opaque, immutable session identity.
    pub session_id: String,
    /// Current position in the step sequence; `None` means unset.
    pub current_step: Option<ConversationStep>,
    /// Append-only message history, oldest first.
    pub history: Vec<ChatMessage>,
    /// Trip data collected so far.
    pub collected_data: CollectedData,
}

impl ConversationSession {
    /// Creates a fresh session positioned at the start of the flow.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            current_step: Some(ConversationStep::first()),
            history: Vec::new(),
            collected_data: CollectedData::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    mod merge_rules {
        use super::*;

        #[test]
        fn fills_empty_fields() {
            let mut data = CollectedData::new();
            let changed = data.merge(
                &delta(&[("destination", json!("Paris"))]),
                &DateNormalizer::new(),
            );
            assert!(changed);
            assert_eq!(data.get_str("destination"), Some("Paris"));
        }

        #[test]
        fn never_overwrites_non_empty_with_empty() {
            let mut data = CollectedData::new();
            let dates = DateNormalizer::new();
            data.merge(&delta(&[("destination", json!("Paris"))]), &dates);
            data.merge(&delta(&[("destination", json!(""))]), &dates);
            assert_eq!(data.get_str("destination"), Some("Paris"));
        }

        #[test]
        fn never_overwrites_non_empty_with_new_value() {
            let mut data = CollectedData::new();
            let dates = DateNormalizer::new();
            data.merge(&delta(&[("destination", json!("Paris"))]), &dates);
            data.merge(&delta(&[("destination", json!("Tokyo"))]), &dates);
            assert_eq!(data.get_str("destination"), Some("Paris"));
        }

        #[test]
        fn skips_null_values() {
            let mut data = CollectedData::new();
            let changed = data.merge(
                &delta(&[("destination", Value::Null)]),
                &DateNormalizer::new(),
            );
            assert!(!changed);
            assert_eq!(data.get_str("destination"), None);
        }

        #[test]
        fn trims_string_values() {
            let mut data = CollectedData::new();
            data.merge(
                &delta(&[("traveler_name", json!("  Ada Lovelace  "))]),
                &DateNormalizer::new(),
            );
            assert_eq!(data.get_str("traveler_name"), Some("Ada Lovelace"));
        }

        #[test]
        fn normalizes_date_fields() {
            let mut data = CollectedData::new();
            data.merge(
                &delta(&[("departure_date", json!("12/31/2025"))]),
                &DateNormalizer::new(),
            );
            assert_eq!(data.get_str("departure_date"), Some("2025-12-31"));
        }

        #[test]
        fn refreshes_timestamp_on_non_empty_merge() {
            let mut data = CollectedData::new();
            let before = data.get_str(TIMESTAMP_FIELD).unwrap().to_string();
            std::thread::sleep(std::time::Duration::from_millis(5));
            data.merge(
                &delta(&[("budget", json!("2000"))]),
                &DateNormalizer::new(),
            );
            let after = data.get_str(TIMESTAMP_FIELD).unwrap();
            assert_ne!(before, after);
        }

        #[test]
        fn empty_delta_leaves_timestamp_alone() {
            let mut data = CollectedData::new();
            let before = data.get_str(TIMESTAMP_FIELD).unwrap().to_string();
            let changed = data.merge(&Map::new(), &DateNormalizer::new());
            assert!(!changed);
            assert_eq!(data.get_str(TIMESTAMP_FIELD), Some(before.as_str()));
        }

        #[test]
        fn tolerates_unexpected_value_types() {
            let mut data = CollectedData::new();
            let changed = data.merge(
                &delta(&[("travelers_count", json!(3))]),
                &DateNormalizer::new(),
            );
            assert!(changed);
            assert_eq!(data.as_map()["travelers_count"], json!(3));
        }

        #[test]
        fn nested_preferences_merge_as_object() {
            let mut data = CollectedData::new();
            data.merge(
                &delta(&[("preferences", json!({"seat": "window"}))]),
                &DateNormalizer::new(),
            );
            assert_eq!(data.as_map()["preferences"]["seat"], "window");
        }
    }

    mod completeness_checks {
        use super::*;

        #[test]
        fn fresh_data_is_blank() {
            assert!(CollectedData::new().is_blank());
        }

        #[test]
        fn any_populated_field_breaks_blankness() {
            let mut data = CollectedData::new();
            data.merge(
                &delta(&[("email", json!("ada@example.com"))]),
                &DateNormalizer::new(),
            );
            assert!(!data.is_blank());
        }

        #[test]
        fn flight_search_fields_require_all_three() {
            let mut data = CollectedData::new();
            let dates = DateNormalizer::new();
            data.merge(&delta(&[("destination", json!("Paris"))]), &dates);
            data.merge(&delta(&[("departure_location", json!("SFO"))]), &dates);
            assert!(!data.has_flight_search_fields());
            data.merge(&delta(&[("departure_date", json!("2025-07-20"))]), &dates);
            assert!(data.has_flight_search_fields());
        }
    }

    mod session {
        use super::*;

        #[test]
        fn new_session_starts_at_first_step() {
            let session = ConversationSession::new("abc");
            assert_eq!(session.current_step, Some(ConversationStep::Greeting));
            assert!(session.history.is_empty());
            assert!(session.collected_data.is_blank());
        }

        #[test]
        fn serializes_round_trip() {
            let mut session = ConversationSession::new("abc");
            session.history.push(ChatMessage::user("hi"));
            session.history.push(ChatMessage::assistant("hello"));

            let json = serde_json::to_string(&session).unwrap();
            let back: ConversationSession = serde_json::from_str(&json).unwrap();
            assert_eq!(back.session_id, "abc");
            assert_eq!(back.history.len(), 2);
            assert_eq!(back.history[0].role, ChatRole::User);
        }
    }

    mod merge_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// A field that already holds a non-empty value is unchanged by
            /// any subsequent merge carrying an empty value for it.
            #[test]
            fn filled_fields_survive_empty_merges(
                initial in "[a-zA-Z]{1,12}",
                blank in proptest::string::string_regex("[ \t]{0,4}").unwrap()
            ) {
                let mut data = CollectedData::new();
                let dates = DateNormalizer::new();
                data.merge(&delta(&[("destination", json!(initial.clone()))]), &dates);
                data.merge(&delta(&[("destination", json!(blank))]), &dates);
                prop_assert_eq!(data.get_str("destination"), Some(initial.as_str()));
            }
        }
    }
}

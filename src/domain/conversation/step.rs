//! Conversation steps.
//!
//! Steps form a fixed, linear sequence with no backward transitions. A
//! step's identity selects which instruction text augments the system
//! prompt; it does not strictly gate data collection (the prompt assembly
//! in the engine handles that implicitly).

use serde::{Deserialize, Serialize};

/// A named phase in the conversation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    /// Opening exchange; warm welcome and first question.
    Greeting,
    /// Collecting the fields needed to run a flight search.
    FlightSearch,
    /// Collecting the traveler's name.
    NameCollection,
    /// Collecting the traveler's email (terminal step).
    EmailCollection,
}

impl ConversationStep {
    /// The default ordered step sequence.
    ///
    /// The engine owns its own copy of this at construction time, so the
    /// flow can be reconfigured without touching a shared global.
    pub fn sequence() -> &'static [ConversationStep] {
        &[
            ConversationStep::Greeting,
            ConversationStep::FlightSearch,
            ConversationStep::NameCollection,
            ConversationStep::EmailCollection,
        ]
    }

    /// First step of the default sequence.
    pub fn first() -> Self {
        ConversationStep::Greeting
    }

    /// Wire/storage name of the step.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStep::Greeting => "greeting",
            ConversationStep::FlightSearch => "flight_search",
            ConversationStep::NameCollection => "name_collection",
            ConversationStep::EmailCollection => "email_collection",
        }
    }

    /// Parses a stored step name; unknown names yield `None` (callers treat
    /// that as "start from the first step").
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "greeting" => Some(ConversationStep::Greeting),
            "flight_search" => Some(ConversationStep::FlightSearch),
            "name_collection" => Some(ConversationStep::NameCollection),
            "email_collection" => Some(ConversationStep::EmailCollection),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the step that follows `current` in `steps`.
///
/// Unrecognized or unset steps restart the sequence; the final step repeats
/// itself. One forward move per turn, never backward.
pub fn next_step(steps: &[ConversationStep], current: Option<ConversationStep>) -> ConversationStep {
    let first = steps.first().copied().unwrap_or_else(ConversationStep::first);
    let current = match current {
        Some(step) => step,
        None => return first,
    };
    match steps.iter().position(|s| *s == current) {
        Some(idx) if idx + 1 < steps.len() => steps[idx + 1],
        Some(_) => current,
        None => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_linear_and_terminal() {
        let steps = ConversationStep::sequence();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], ConversationStep::Greeting);
        assert_eq!(steps[3], ConversationStep::EmailCollection);
    }

    #[test]
    fn advances_one_step_per_turn() {
        let steps = ConversationStep::sequence();
        assert_eq!(
            next_step(steps, Some(ConversationStep::Greeting)),
            ConversationStep::FlightSearch
        );
        assert_eq!(
            next_step(steps, Some(ConversationStep::FlightSearch)),
            ConversationStep::NameCollection
        );
    }

    #[test]
    fn terminal_step_repeats() {
        let steps = ConversationStep::sequence();
        assert_eq!(
            next_step(steps, Some(ConversationStep::EmailCollection)),
            ConversationStep::EmailCollection
        );
    }

    #[test]
    fn unset_step_restarts_sequence() {
        let steps = ConversationStep::sequence();
        assert_eq!(next_step(steps, None), ConversationStep::Greeting);
    }

    #[test]
    fn step_missing_from_configured_sequence_restarts() {
        let steps = [ConversationStep::FlightSearch, ConversationStep::NameCollection];
        assert_eq!(
            next_step(&steps, Some(ConversationStep::Greeting)),
            ConversationStep::FlightSearch
        );
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&ConversationStep::NameCollection).unwrap();
        assert_eq!(json, "\"name_collection\"");
    }

    #[test]
    fn parse_round_trips_all_steps() {
        for step in ConversationStep::sequence() {
            assert_eq!(ConversationStep::parse(step.as_str()), Some(*step));
        }
        assert_eq!(ConversationStep::parse("payment_collection"), None);
    }
}

//! System prompt construction.
//!
//! Each step gets its own instruction block, followed by a shared response
//! contract that tells the model to answer in JSON and shows it the trip
//! data collected so far.

use crate::domain::conversation::response::NormalizedResponse;
use crate::domain::conversation::session::CollectedData;
use crate::domain::conversation::step::ConversationStep;

/// Tool name the model may invoke during the flight search step.
pub const SEARCH_FLIGHTS_TOOL: &str = "search_flights";

/// Builds the full system prompt for a turn.
pub fn system_prompt(step: ConversationStep, collected: &CollectedData) -> String {
    format!(
        "{}\n\n{}",
        step_instructions(step),
        response_contract(collected)
    )
}

fn step_instructions(step: ConversationStep) -> &'static str {
    match step {
        ConversationStep::Greeting => {
            "You are TripBot, a friendly trip planning assistant. Greet the user \
             warmly, introduce yourself in one or two sentences, and ask where \
             they would like to travel. Keep it short."
        }
        ConversationStep::FlightSearch => {
            "You are TripBot, a trip planning assistant gathering flight details. \
             Collect the destination, departure location, departure date and, if \
             the user wants a round trip, the return date. Record every detail \
             the user mentions in user_data. Ask for exactly one missing detail \
             at a time. Once you know the destination, departure location and \
             departure date, request the search_flights tool by setting \
             tool_call to \"search_flights\" and putting the search parameters \
             as a single object in tool_parameters."
        }
        ConversationStep::NameCollection => {
            "You are TripBot, a trip planning assistant. The flight details are \
             gathered. Ask the user for their full name so the booking can be \
             prepared, and record it in user_data under traveler_name."
        }
        ConversationStep::EmailCollection => {
            "You are TripBot, a trip planning assistant finishing a booking. Ask \
             the user for their email address to send the itinerary to, record \
             it in user_data under email, and thank them once you have it."
        }
    }
}

fn response_contract(collected: &CollectedData) -> String {
    let snapshot = serde_json::to_string_pretty(collected.as_map())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "Respond with a single JSON object containing exactly these keys:\n\
         - \"message\": a statement for the user, or \"\"\n\
         - \"question\": one question for the user, or \"\"\n\
         - \"user_data\": an object with any trip details learned this turn\n\
         - \"tool_call\": the tool to invoke, or \"\"\n\
         - \"tool_parameters\": a list of arguments for the tool\n\
         Do not wrap the JSON in markdown or prose.\n\n\
         Trip details collected so far:\n{snapshot}"
    )
}

/// The text to show for a stored assistant message. Assistant history is
/// persisted as serialized response JSON; prefer its question, then its
/// message, then the raw content.
pub fn assistant_display_text(content: &str) -> String {
    match serde_json::from_str::<NormalizedResponse>(content) {
        Ok(response) => {
            let text = response.display_text().trim();
            if text.is_empty() {
                content.to_string()
            } else {
                text.to_string()
            }
        }
        Err(_) => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_embeds_collected_snapshot() {
        let mut collected = CollectedData::new();
        collected.merge(
            &[("destination".to_string(), json!("Paris"))]
                .into_iter()
                .collect(),
            &crate::domain::dates::DateNormalizer::new(),
        );

        let prompt = system_prompt(ConversationStep::FlightSearch, &collected);
        assert!(prompt.contains("search_flights"));
        assert!(prompt.contains("\"destination\": \"Paris\""));
        assert!(prompt.contains("Respond with a single JSON object"));
    }

    #[test]
    fn each_step_has_distinct_instructions() {
        let collected = CollectedData::new();
        let prompts: Vec<String> = ConversationStep::sequence()
            .iter()
            .map(|step| system_prompt(*step, &collected))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn assistant_display_prefers_question() {
        let content = json!({
            "message": "Noted.",
            "question": "What is your email?"
        })
        .to_string();
        assert_eq!(assistant_display_text(&content), "What is your email?");
    }

    #[test]
    fn assistant_display_falls_back_to_raw_text() {
        assert_eq!(assistant_display_text("plain reply"), "plain reply");
    }
}

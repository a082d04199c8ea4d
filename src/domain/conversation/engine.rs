//! Conversation turn engine.
//!
//! One call per user turn: format history, pick the instruction block,
//! call the model, normalize, merge extracted data, dispatch a flight
//! search when requested, and advance the step counter. The engine has no
//! side effects; the caller persists the returned state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::conversation::normalizer::ResponseNormalizer;
use crate::domain::conversation::prompts::{self, SEARCH_FLIGHTS_TOOL};
use crate::domain::conversation::response::NormalizedResponse;
use crate::domain::conversation::session::{
    ChatMessage, ChatRole, CollectedData, ConversationSession,
};
use crate::domain::conversation::step::{next_step, ConversationStep};
use crate::domain::dates::DateNormalizer;
use crate::domain::flights::{FlightSearchClient, FlightSearchError, FlightSearchRequest, SortKey};
use crate::ports::llm_provider::{LlmError, LlmProvider};

/// A user message with fewer words than this, arriving as the first
/// history entry, is treated as a bare greeting.
const GREETING_WORD_LIMIT: usize = 4;

/// Everything one turn produces. Persisting it is the caller's job.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: NormalizedResponse,
    pub next_step: ConversationStep,
    pub collected_data: CollectedData,
}

pub struct ConversationEngine {
    llm: Arc<dyn LlmProvider>,
    flights: Option<Arc<FlightSearchClient>>,
    steps: Vec<ConversationStep>,
    normalizer: ResponseNormalizer,
    dates: DateNormalizer,
}

impl ConversationEngine {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            flights: None,
            steps: ConversationStep::sequence().to_vec(),
            normalizer: ResponseNormalizer::new(),
            dates: DateNormalizer::new(),
        }
    }

    /// Enables flight search dispatch for `search_flights` tool calls.
    pub fn with_flight_search(mut self, client: Arc<FlightSearchClient>) -> Self {
        self.flights = Some(client);
        self
    }

    /// Overrides the step sequence. Must be non-empty.
    pub fn with_steps(mut self, steps: Vec<ConversationStep>) -> Self {
        if !steps.is_empty() {
            self.steps = steps;
        }
        self
    }

    /// Runs one turn. Model failures propagate untouched; fallback
    /// messaging is the caller's policy.
    pub async fn generate_response(
        &self,
        session: &ConversationSession,
        user_message: &str,
    ) -> Result<TurnOutcome, LlmError> {
        let mut messages = format_history(&session.history);
        messages.push(ChatMessage::user(user_message));

        let mut collected = session.collected_data.clone();
        let instruction_step = self.instruction_step(session, &messages, &collected);
        let system_prompt = prompts::system_prompt(instruction_step, &collected);

        debug!(
            provider = self.llm.name(),
            step = instruction_step.as_str(),
            turns = messages.len(),
            "generating assistant response"
        );

        let raw = self.llm.generate(&system_prompt, &messages).await?;
        let mut response = self.normalizer.normalize(raw);

        if !response.user_data.is_empty() {
            collected.merge(&response.user_data, &self.dates);
        }

        if response.wants_tool() {
            self.dispatch_tool(&mut response, &collected).await;
        }

        Ok(TurnOutcome {
            response,
            next_step: next_step(&self.steps, session.current_step),
            collected_data: collected,
        })
    }

    /// Picks which instruction block augments the system prompt. Greeting
    /// turns get the greeting block; otherwise the flight-search block
    /// stays active until its fields are complete, after which the nominal
    /// step's block applies.
    fn instruction_step(
        &self,
        session: &ConversationSession,
        messages: &[ChatMessage],
        collected: &CollectedData,
    ) -> ConversationStep {
        if is_greeting(messages, collected) {
            return ConversationStep::Greeting;
        }
        if !collected.has_flight_search_fields() {
            return ConversationStep::FlightSearch;
        }
        session.current_step.unwrap_or_else(ConversationStep::first)
    }

    /// Runs the requested tool and folds its output into the reply text.
    /// Tool failures never fail the turn.
    async fn dispatch_tool(&self, response: &mut NormalizedResponse, collected: &CollectedData) {
        if response.tool_call != SEARCH_FLIGHTS_TOOL {
            warn!(tool = %response.tool_call, "ignoring unknown tool call");
            return;
        }
        let Some(client) = &self.flights else {
            warn!("flight search requested but no client is configured");
            return;
        };
        let Some(request) = self.tool_request(response, collected) else {
            warn!("flight search requested without usable parameters");
            return;
        };

        let addition = match client.search(&request, SortKey::Duration).await {
            Ok(offers) => format_offers(&offers),
            Err(FlightSearchError::Invalid(err)) => {
                format!("I couldn't search for flights: {err}.")
            }
            Err(FlightSearchError::Provider(err)) => {
                warn!(error = %err, "flight search provider failed");
                "I couldn't reach the flight search service just now. Please try again in a moment."
                    .to_string()
            }
        };

        if response.message.trim().is_empty() {
            response.message = addition;
        } else {
            response.message = format!("{}\n\n{}", response.message, addition);
        }
    }

    /// Builds the search request from the first tool parameter object,
    /// filling gaps from collected data.
    fn tool_request(
        &self,
        response: &NormalizedResponse,
        collected: &CollectedData,
    ) -> Option<FlightSearchRequest> {
        let params = response
            .tool_parameters
            .first()
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
        let mut request: FlightSearchRequest = serde_json::from_value(params).ok()?;

        if request.destination.is_empty() {
            request.destination = collected.get_str("destination")?.to_string();
        }
        if request.origin.is_empty() {
            request.origin = collected.get_str("departure_location")?.to_string();
        }
        if request.departure_date.is_empty() {
            request.departure_date = collected.get_str("departure_date")?.to_string();
        }
        if request.return_date.is_none() {
            request.return_date = collected.get_str("return_date").map(str::to_string);
        }
        Some(request)
    }
}

/// Rebuilds history for the provider, replacing stored assistant JSON
/// with its human-readable question or message.
fn format_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|message| match message.role {
            ChatRole::Assistant => {
                ChatMessage::assistant(prompts::assistant_display_text(&message.content))
            }
            ChatRole::User => message.clone(),
        })
        .collect()
}

/// A turn is a bare greeting when the conversation has fewer than two
/// entries and either the first user entry is terse or nothing has been
/// collected yet.
fn is_greeting(messages: &[ChatMessage], collected: &CollectedData) -> bool {
    if messages.len() >= 2 {
        return false;
    }
    let terse_opener = messages
        .first()
        .map(|m| {
            m.role == ChatRole::User
                && m.content.split_whitespace().count() < GREETING_WORD_LIMIT
        })
        .unwrap_or(false);
    terse_opener || collected.is_blank()
}

/// Renders a short numbered summary of offers for the reply text.
fn format_offers(offers: &[crate::domain::flights::FlightOffer]) -> String {
    if offers.is_empty() {
        return "I couldn't find any flights matching those details.".to_string();
    }

    let mut lines = vec!["Here are the flights I found:".to_string()];
    for (index, offer) in offers.iter().enumerate() {
        let route = offer
            .itineraries
            .first()
            .and_then(|itinerary| {
                let first = itinerary.segments.first()?;
                let last = itinerary.segments.last()?;
                Some(format!(
                    "{} {} departs {} at {}, arrives {} at {}",
                    first.carrier_code,
                    first.number,
                    first.departure.iata_code,
                    first.departure.at,
                    last.arrival.iata_code,
                    last.arrival.at,
                ))
            })
            .unwrap_or_else(|| "itinerary unavailable".to_string());
        lines.push(format!(
            "{}. {} - {} {}",
            index + 1,
            route,
            offer.price.total,
            offer.price.currency,
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::domain::flights::offer::test_offer;
    use crate::ports::flight_provider::{
        FlightProvider, FlightProviderError, OfferSearchParams, OffersPage,
    };
    use crate::ports::llm_provider::RawLlmResponse;

    /// Returns canned responses in order and records the prompts it saw.
    struct ScriptedLlm {
        responses: Mutex<Vec<RawLlmResponse>>,
        prompts: Mutex<Vec<String>>,
        fail_with: Option<fn() -> LlmError>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<RawLlmResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(fail_with: fn() -> LlmError) -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
                fail_with: Some(fail_with),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts
                .lock()
                .unwrap()
                .last()
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(
            &self,
            system_prompt: &str,
            _history: &[ChatMessage],
        ) -> Result<RawLlmResponse, LlmError> {
            self.prompts.lock().unwrap().push(system_prompt.to_string());
            if let Some(make_error) = self.fail_with {
                return Err(make_error());
            }
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(RawLlmResponse::Text("Okay.".to_string()))
            } else {
                Ok(responses.remove(0))
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct StaticFlights(Vec<crate::domain::flights::FlightOffer>);

    #[async_trait]
    impl FlightProvider for StaticFlights {
        async fn search_offers(
            &self,
            _params: &OfferSearchParams,
        ) -> Result<OffersPage, FlightProviderError> {
            Ok(OffersPage {
                offers: self.0.clone(),
                meta: None,
            })
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    fn engine_with(responses: Vec<RawLlmResponse>) -> (ConversationEngine, Arc<ScriptedLlm>) {
        let llm = Arc::new(ScriptedLlm::new(responses));
        (ConversationEngine::new(llm.clone()), llm)
    }

    #[tokio::test]
    async fn first_terse_message_gets_the_greeting_block() {
        let (engine, llm) = engine_with(vec![RawLlmResponse::Text("Hello there!".into())]);
        let session = ConversationSession::new("s1");

        engine.generate_response(&session, "hi").await.unwrap();
        assert!(llm.last_prompt().contains("Greet the user"));
    }

    #[tokio::test]
    async fn longer_openers_with_blank_data_still_greet() {
        let (engine, llm) = engine_with(vec![RawLlmResponse::Text("Hello!".into())]);
        let session = ConversationSession::new("s1");

        engine
            .generate_response(&session, "I want to plan a big family trip to Japan")
            .await
            .unwrap();
        assert!(llm.last_prompt().contains("Greet the user"));
    }

    #[tokio::test]
    async fn incomplete_flight_fields_keep_the_collection_block() {
        let (engine, llm) = engine_with(vec![RawLlmResponse::Text("Noted.".into())]);
        let mut session = ConversationSession::new("s1");
        session.current_step = Some(ConversationStep::NameCollection);
        session.history.push(ChatMessage::user("I want to travel"));
        session.history.push(ChatMessage::assistant("Where to?"));
        session.collected_data.merge(
            &[("destination".to_string(), json!("Paris"))]
                .into_iter()
                .collect(),
            &DateNormalizer::new(),
        );

        engine.generate_response(&session, "From SFO").await.unwrap();
        assert!(llm.last_prompt().contains("gathering flight details"));
    }

    #[tokio::test]
    async fn advances_exactly_one_step_per_turn() {
        let (engine, _) = engine_with(vec![
            RawLlmResponse::Text("Hi!".into()),
            RawLlmResponse::Text("Where from?".into()),
        ]);
        let mut session = ConversationSession::new("s1");

        let outcome = engine.generate_response(&session, "hello").await.unwrap();
        assert_eq!(outcome.next_step, ConversationStep::FlightSearch);

        session.current_step = Some(outcome.next_step);
        let outcome = engine
            .generate_response(&session, "Paris please")
            .await
            .unwrap();
        assert_eq!(outcome.next_step, ConversationStep::NameCollection);
    }

    #[tokio::test]
    async fn merges_extracted_user_data() {
        let normalized: NormalizedResponse = serde_json::from_value(json!({
            "message": "Paris, great!",
            "question": "When do you want to leave?",
            "user_data": {"destination": "Paris", "departure_date": "12/31/2025"}
        }))
        .unwrap();
        let (engine, _) = engine_with(vec![RawLlmResponse::Normalized(normalized)]);
        let session = ConversationSession::new("s1");

        let outcome = engine
            .generate_response(&session, "I want to go to Paris")
            .await
            .unwrap();
        assert_eq!(outcome.collected_data.get_str("destination"), Some("Paris"));
        assert_eq!(
            outcome.collected_data.get_str("departure_date"),
            Some("2025-12-31")
        );
    }

    #[tokio::test]
    async fn dispatches_flight_search_and_folds_offers_into_message() {
        let normalized: NormalizedResponse = serde_json::from_value(json!({
            "message": "Searching for flights now.",
            "tool_call": "search_flights",
            "tool_parameters": [{
                "origin": "SFO",
                "destination": "JFK",
                "departure_date": "2025-07-20"
            }]
        }))
        .unwrap();

        let offers = vec![
            test_offer("a", "PT5H", "300.00", "2025-07-20T08:00:00", "2025-07-20T13:00:00"),
            test_offer("b", "PT4H10M", "410.00", "2025-07-20T09:00:00", "2025-07-20T13:10:00"),
        ];
        let client = Arc::new(FlightSearchClient::new(Arc::new(StaticFlights(offers))));

        let llm = Arc::new(ScriptedLlm::new(vec![RawLlmResponse::Normalized(normalized)]));
        let engine = ConversationEngine::new(llm).with_flight_search(client);
        let session = ConversationSession::new("s1");

        let outcome = engine
            .generate_response(&session, "find flights")
            .await
            .unwrap();
        assert!(outcome
            .response
            .message
            .starts_with("Searching for flights now."));
        assert!(outcome
            .response
            .message
            .contains("Here are the flights I found:"));
        // duration sort puts the shorter flight first
        let a_pos = outcome.response.message.find("300.00").unwrap();
        let b_pos = outcome.response.message.find("410.00").unwrap();
        assert!(b_pos < a_pos);
    }

    #[tokio::test]
    async fn invalid_tool_request_folds_the_reason_into_message() {
        let normalized: NormalizedResponse = serde_json::from_value(json!({
            "tool_call": "search_flights",
            "tool_parameters": [{
                "origin": "SFO",
                "destination": "JFK",
                "departure_date": "2025-07-20",
                "adults": 1,
                "infants": 2
            }]
        }))
        .unwrap();

        let client = Arc::new(FlightSearchClient::new(Arc::new(StaticFlights(vec![]))));
        let llm = Arc::new(ScriptedLlm::new(vec![RawLlmResponse::Normalized(normalized)]));
        let engine = ConversationEngine::new(llm).with_flight_search(client);
        let session = ConversationSession::new("s1");

        let outcome = engine
            .generate_response(&session, "find flights")
            .await
            .unwrap();
        assert!(outcome
            .response
            .message
            .contains("Number of infants cannot exceed number of adults"));
    }

    #[tokio::test]
    async fn tool_params_fall_back_to_collected_data() {
        let normalized: NormalizedResponse = serde_json::from_value(json!({
            "tool_call": "search_flights",
            "tool_parameters": []
        }))
        .unwrap();

        let offers = vec![test_offer(
            "a",
            "PT5H",
            "300.00",
            "2025-07-20T08:00:00",
            "2025-07-20T13:00:00",
        )];
        let client = Arc::new(FlightSearchClient::new(Arc::new(StaticFlights(offers))));
        let llm = Arc::new(ScriptedLlm::new(vec![RawLlmResponse::Normalized(normalized)]));
        let engine = ConversationEngine::new(llm).with_flight_search(client);

        let mut session = ConversationSession::new("s1");
        session.collected_data.merge(
            &[
                ("destination".to_string(), json!("JFK")),
                ("departure_location".to_string(), json!("SFO")),
                ("departure_date".to_string(), json!("2025-07-20")),
            ]
            .into_iter()
            .collect(),
            &DateNormalizer::new(),
        );

        let outcome = engine
            .generate_response(&session, "go ahead")
            .await
            .unwrap();
        assert!(outcome
            .response
            .message
            .contains("Here are the flights I found:"));
    }

    #[tokio::test]
    async fn model_errors_propagate_to_the_caller() {
        let llm = Arc::new(ScriptedLlm::failing(|| LlmError::Throttled("429".into())));
        let engine = ConversationEngine::new(llm);
        let session = ConversationSession::new("s1");

        let err = engine
            .generate_response(&session, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Throttled(_)));
    }

    #[tokio::test]
    async fn empty_provider_output_is_a_valid_outcome() {
        let (engine, _) = engine_with(vec![RawLlmResponse::Blocks(vec![])]);
        let session = ConversationSession::new("s1");

        let outcome = engine.generate_response(&session, "hello").await.unwrap();
        assert!(outcome.response.message.is_empty());
        assert!(outcome.response.question.is_empty());
    }
}

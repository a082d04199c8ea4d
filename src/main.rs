//! TripBot server entrypoint.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tripbot::adapters::http::{app_router, ChatAppState};
use tripbot::adapters::storage::InMemorySessionStore;
use tripbot::adapters::{flights, llm};
use tripbot::application::ChatService;
use tripbot::config::AppConfig;
use tripbot::domain::conversation::ConversationEngine;
use tripbot::domain::flights::{FlightSearchClient, RetryPolicy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let llm_provider = llm::provider_from_config(&config.llm)?;
    let flight_provider = flights::provider_from_config(&config.flights)?;

    let retry = RetryPolicy {
        max_retries: config.flights.max_retries,
        initial_delay: config.flights.initial_delay(),
        backoff_factor: config.flights.backoff_factor,
        jitter: config.flights.jitter,
    };
    let flight_client = Arc::new(
        FlightSearchClient::with_retry_policy(flight_provider, retry)
            .with_max_results(config.flights.max_results),
    );

    let engine = ConversationEngine::new(llm_provider).with_flight_search(flight_client);
    let store = Arc::new(InMemorySessionStore::new());
    let chat = Arc::new(ChatService::new(engine, store));

    let app = app_router(&config.server, ChatAppState::new(chat));

    let addr = config.server.socket_addr()?;
    info!(%addr, environment = ?config.server.environment, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

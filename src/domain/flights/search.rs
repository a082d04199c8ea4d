//! Retrying flight search client.
//!
//! Wraps a [`FlightProvider`] with request validation, exponential-backoff
//! retries, and result ordering. Validation failures never reach the
//! provider and incur no delay.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::flights::offer::{FlightOffer, SortKey};
use crate::domain::flights::request::{FlightSearchRequest, RequestValidationError};
use crate::ports::flight_provider::{FlightProvider, FlightProviderError};

#[derive(Debug, Error)]
pub enum FlightSearchError {
    #[error(transparent)]
    Invalid(#[from] RequestValidationError),

    #[error(transparent)]
    Provider(#[from] FlightProviderError),
}

/// Backoff parameters for repeated provider calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts beyond the first try.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    /// Adds up to 25% of the current delay, uniformly drawn.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    fn delay_with_jitter(&self, delay: Duration) -> Duration {
        if self.jitter {
            let fraction = rand::thread_rng().gen_range(0.0..0.25);
            delay + delay.mul_f64(fraction)
        } else {
            delay
        }
    }
}

/// Validates, searches with retries, and sorts.
pub struct FlightSearchClient {
    provider: Arc<dyn FlightProvider>,
    retry: RetryPolicy,
    /// Configured result cap, applied when a request leaves its own unset.
    max_results: Option<u32>,
}

impl FlightSearchClient {
    pub fn new(provider: Arc<dyn FlightProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            max_results: None,
        }
    }

    pub fn with_retry_policy(provider: Arc<dyn FlightProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            max_results: None,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Runs one search. Invalid requests fail immediately without a
    /// provider call. Retryable provider failures are retried with
    /// exponential backoff; the last error is returned when attempts run
    /// out. A sort failure returns the offers unsorted.
    pub async fn search(
        &self,
        request: &FlightSearchRequest,
        sort: SortKey,
    ) -> Result<Vec<FlightOffer>, FlightSearchError> {
        request.validate()?;
        let mut params = request.to_params();
        if request.max_results.is_none() {
            if let Some(max) = self.max_results {
                params.max = max;
            }
        }

        debug!(
            provider = self.provider.name(),
            origin = %params.origin_location_code,
            destination = %params.destination_location_code,
            departure_date = %params.departure_date,
            "searching flight offers"
        );

        let mut delay = self.retry.initial_delay;
        let mut attempt: u32 = 0;
        let page = loop {
            match self.provider.search_offers(&params).await {
                Ok(page) => break page,
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let wait = self.retry.delay_with_jitter(delay);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "flight search failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    delay = delay.mul_f64(self.retry.backoff_factor);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        let mut offers = page.offers;
        if let Err(failure) = sort.sort(&mut offers) {
            warn!(%failure, ?sort, "could not sort offers, returning unsorted");
        }
        Ok(offers)
    }
}

//! Mock flight search backend for tests and offline development.
//!
//! Fabricates plausible offers for the requested route: a fixed airline
//! catalog, randomized prices, and departure times spread across the day.

use async_trait::async_trait;
use rand::Rng;

use crate::domain::flights::offer::{
    FlightOffer, Itinerary, OfferPrice, Segment, SegmentEndpoint,
};
use crate::ports::flight_provider::{
    FlightProvider, FlightProviderError, OfferSearchParams, OffersPage,
};

const AIRLINES: [(&str, &str); 5] = [
    ("SL", "SkyLine Airways"),
    ("GE", "Global Express"),
    ("BA", "Budget Air"),
    ("PW", "Premium Wings"),
    ("EP", "Economy Plus"),
];

/// Duration in minutes for each catalog airline, shortest to longest.
const DURATIONS_MIN: [i64; 5] = [225, 255, 330, 200, 285];

#[derive(Default)]
pub struct MockFlightProvider;

impl MockFlightProvider {
    pub fn new() -> Self {
        Self
    }

    fn build_offer(&self, index: usize, params: &OfferSearchParams) -> FlightOffer {
        let (code, _) = AIRLINES[index % AIRLINES.len()];
        let minutes = DURATIONS_MIN[index % DURATIONS_MIN.len()];
        let depart_hour = 6 + (index * 3) % 15;
        let arrive_total = depart_hour as i64 * 60 + minutes;

        let departure_at = format!("{}T{:02}:00:00", params.departure_date, depart_hour);
        let arrival_at = format!(
            "{}T{:02}:{:02}:00",
            params.departure_date,
            (arrive_total / 60) % 24,
            arrive_total % 60
        );

        let price = rand::thread_rng().gen_range(320.0..700.0_f64);

        FlightOffer {
            id: format!("mock-{}", index + 1),
            itineraries: vec![Itinerary {
                duration: format!("PT{}H{}M", minutes / 60, minutes % 60),
                segments: vec![Segment {
                    departure: SegmentEndpoint {
                        iata_code: params.origin_location_code.clone(),
                        at: departure_at,
                    },
                    arrival: SegmentEndpoint {
                        iata_code: params.destination_location_code.clone(),
                        at: arrival_at,
                    },
                    carrier_code: code.to_string(),
                    number: format!("{}", 100 + index),
                    duration: None,
                }],
            }],
            price: OfferPrice {
                currency: params.currency_code.clone(),
                total: format!("{price:.2}"),
            },
            extra: serde_json::Map::new(),
        }
    }
}

#[async_trait]
impl FlightProvider for MockFlightProvider {
    async fn search_offers(
        &self,
        params: &OfferSearchParams,
    ) -> Result<OffersPage, FlightProviderError> {
        let count = params.max.min(AIRLINES.len() as u32) as usize;
        let offers = (0..count)
            .map(|index| self.build_offer(index, params))
            .collect();
        Ok(OffersPage {
            offers,
            meta: Some(serde_json::json!({"count": count, "mock": true})),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

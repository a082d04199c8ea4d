//! Trip cost estimation.
//!
//! Prices come from a small built-in catalog; this is an estimate shown at
//! the end of the conversation, not a live quote.

use rand::seq::SliceRandom;
use rand::Rng;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::domain::conversation::session::CollectedData;

/// Nights assumed for one-way trips with no return date.
const DEFAULT_NIGHTS: i64 = 3;
/// Taxes and fees as a fraction of the subtotal.
const TAX_RATE: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelOption {
    pub name: &'static str,
    pub rating: f64,
    pub price_per_night: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOption {
    pub airline: &'static str,
    pub price: f64,
    pub duration: &'static str,
}

const HOTELS: [HotelOption; 5] = [
    HotelOption { name: "Grand Plaza Hotel", rating: 4.5, price_per_night: 150.0 },
    HotelOption { name: "Comfort Inn & Suites", rating: 4.0, price_per_night: 120.0 },
    HotelOption { name: "Luxury Resort & Spa", rating: 5.0, price_per_night: 300.0 },
    HotelOption { name: "Budget Express Hotel", rating: 3.5, price_per_night: 80.0 },
    HotelOption { name: "Boutique City Hotel", rating: 4.2, price_per_night: 200.0 },
];

const FLIGHTS: [FlightOption; 5] = [
    FlightOption { airline: "SkyLine Airways", price: 450.0, duration: "3h 45m" },
    FlightOption { airline: "Global Express", price: 520.0, duration: "4h 15m" },
    FlightOption { airline: "Budget Air", price: 380.0, duration: "5h 30m" },
    FlightOption { airline: "Premium Wings", price: 680.0, duration: "3h 20m" },
    FlightOption { airline: "Economy Plus", price: 420.0, duration: "4h 45m" },
];

/// Itemized estimate for a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub flight_details: FlightOption,
    pub hotel_details: HotelOption,
    pub flight_cost: f64,
    pub hotel_cost: f64,
    pub nights: i64,
    pub subtotal: f64,
    pub taxes_and_fees: f64,
    pub total_cost: f64,
    pub travelers_count: u32,
}

/// Builds an estimate from collected trip data.
///
/// Nights are derived from departure and return dates, falling back to a
/// fixed default for one-way trips and for date ranges that run backwards.
/// Round trips double the flight cost.
/// Returns `None` when the departure date is missing or unparseable.
pub fn estimate_trip_cost(collected: &CollectedData) -> Option<CostBreakdown> {
    let departure = collected.get_str("departure_date")?;
    let departure = match NaiveDate::parse_from_str(departure, "%Y-%m-%d") {
        Ok(date) => date,
        Err(err) => {
            warn!(%err, "cannot estimate trip cost, bad departure date");
            return None;
        }
    };

    let travelers_count: u32 = collected
        .get_str("travelers_count")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);

    let nights = match collected.get_str("return_date") {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(return_date) => {
                let span = (return_date - departure).num_days();
                if span < 0 {
                    warn!(%raw, "return date precedes departure, using default nights");
                    DEFAULT_NIGHTS
                } else {
                    span
                }
            }
            Err(_) => DEFAULT_NIGHTS,
        },
        None => DEFAULT_NIGHTS,
    };

    let mut rng = rand::thread_rng();
    let hotel = pick_hotel(&mut rng);
    let flight = pick_flight(&mut rng);

    let mut flight_cost = flight.price * f64::from(travelers_count);
    if collected.get_str("trip_type") == Some("round_trip") {
        flight_cost *= 2.0;
    }
    let hotel_cost = hotel.price_per_night * nights as f64 * f64::from(travelers_count);

    let subtotal = flight_cost + hotel_cost;
    let taxes_and_fees = subtotal * TAX_RATE;

    Some(CostBreakdown {
        flight_details: flight,
        hotel_details: hotel,
        flight_cost,
        hotel_cost,
        nights,
        subtotal,
        taxes_and_fees,
        total_cost: subtotal + taxes_and_fees,
        travelers_count,
    })
}

/// Outcome of a mocked payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_number: Option<String>,
    pub amount_charged: f64,
}

/// Simulates charging for a trip. No gateway is involved; roughly one in
/// four attempts fails so callers exercise both paths.
pub fn process_payment(amount: f64) -> PaymentReceipt {
    let mut rng = rand::thread_rng();
    if rng.gen_range(0..4) == 0 {
        return PaymentReceipt {
            success: false,
            confirmation_number: None,
            amount_charged: 0.0,
        };
    }
    PaymentReceipt {
        success: true,
        confirmation_number: Some(format!("TRP{}", rng.gen_range(100_000..1_000_000))),
        amount_charged: amount,
    }
}

fn pick_hotel<R: Rng>(rng: &mut R) -> HotelOption {
    HOTELS
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| HOTELS[0].clone())
}

fn pick_flight<R: Rng>(rng: &mut R) -> FlightOption {
    FLIGHTS
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| FLIGHTS[0].clone())
}

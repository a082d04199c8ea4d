//! Flight offer model and result ordering.
//!
//! Offers are provider-sourced and treated as read-only. Only the fields
//! the sort comparators and the conversation need are modelled; everything
//! else rides along untouched in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An airport touchpoint of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEndpoint {
    pub iata_code: String,
    /// Local date-time, ISO 8601.
    pub at: String,
}

/// One flight leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: SegmentEndpoint,
    pub arrival: SegmentEndpoint,
    pub carrier_code: String,
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// A sequence of segments flown as one journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Total journey duration, ISO 8601 (`PT5H30M`).
    pub duration: String,
    pub segments: Vec<Segment>,
}

/// Price as quoted by the provider. `total` stays a string to avoid
/// re-rounding provider decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPrice {
    pub currency: String,
    pub total: String,
}

/// One bookable offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    #[serde(default)]
    pub id: String,
    pub itineraries: Vec<Itinerary>,
    pub price: OfferPrice,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightOffer {
    /// Total duration of the first itinerary in minutes, when parseable.
    pub fn duration_minutes(&self) -> Option<i64> {
        let itinerary = self.itineraries.first()?;
        parse_iso8601_duration_minutes(&itinerary.duration)
    }

    /// Departure time of the first segment.
    pub fn departure_at(&self) -> Option<&str> {
        let first = self.itineraries.first()?.segments.first()?;
        Some(first.departure.at.as_str())
    }

    /// Arrival time of the last segment of the first itinerary.
    pub fn arrival_at(&self) -> Option<&str> {
        let last = self.itineraries.first()?.segments.last()?;
        Some(last.arrival.at.as_str())
    }

    pub fn total_price(&self) -> Option<f64> {
        self.price.total.parse().ok()
    }
}

/// How to order a result set. Ascending in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Duration,
    Price,
    DepartureTime,
    ArrivalTime,
}

impl SortKey {
    /// Sorts offers in place. Fails (leaving the order untouched) when
    /// any offer is missing the data the comparator needs; callers log
    /// and fall through to the unsorted set.
    pub fn sort(&self, offers: &mut [FlightOffer]) -> Result<(), SortFailure> {
        match self {
            SortKey::Duration => {
                let keys = extract_keys(offers, |offer| offer.duration_minutes())?;
                sort_with(offers, keys);
            }
            SortKey::Price => {
                let keys = extract_keys(offers, |offer| {
                    offer.total_price().map(ordered_float::OrderedFloat)
                })?;
                sort_with(offers, keys);
            }
            SortKey::DepartureTime => {
                let keys = extract_keys(offers, |offer| {
                    offer.departure_at().map(str::to_string)
                })?;
                sort_with(offers, keys);
            }
            SortKey::ArrivalTime => {
                let keys =
                    extract_keys(offers, |offer| offer.arrival_at().map(str::to_string))?;
                sort_with(offers, keys);
            }
        }
        Ok(())
    }
}

/// An offer lacked the field the comparator needed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("offer at index {index} is missing data for the requested sort")]
pub struct SortFailure {
    pub index: usize,
}

fn extract_keys<K: Ord>(
    offers: &[FlightOffer],
    key_of: impl Fn(&FlightOffer) -> Option<K>,
) -> Result<Vec<K>, SortFailure> {
    offers
        .iter()
        .enumerate()
        .map(|(index, offer)| key_of(offer).ok_or(SortFailure { index }))
        .collect()
}

/// Stable sort of `offers` by precomputed keys.
fn sort_with<K: Ord>(offers: &mut [FlightOffer], keys: Vec<K>) {
    let mut order: Vec<usize> = (0..offers.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut sorted: Vec<FlightOffer> = order.iter().map(|&i| offers[i].clone()).collect();
    for (slot, offer) in offers.iter_mut().zip(sorted.drain(..)) {
        *slot = offer;
    }
}

mod ordered_float {
    use std::cmp::Ordering;

    /// Total order over f64 for use as a sort key.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct OrderedFloat(pub f64);

    impl Eq for OrderedFloat {}

    impl PartialOrd for OrderedFloat {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for OrderedFloat {
        fn cmp(&self, other: &Self) -> Ordering {
            self.0.total_cmp(&other.0)
        }
    }
}

/// Parses ISO 8601 durations of the shape `P[nD]T[nH][nM][nS]` into whole
/// minutes. Seconds truncate.
pub fn parse_iso8601_duration_minutes(input: &str) -> Option<i64> {
    let rest = input.strip_prefix('P')?;
    let (day_part, time_part) = match rest.split_once('T') {
        Some((days, time)) => (days, time),
        None => (rest, ""),
    };

    let mut total_seconds: i64 = 0;

    if !day_part.is_empty() {
        let days: i64 = day_part.strip_suffix('D')?.parse().ok()?;
        total_seconds += days * 86_400;
    }

    let mut number = String::new();
    for ch in time_part.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let value: i64 = number.parse().ok()?;
        number.clear();
        match ch {
            'H' => total_seconds += value * 3_600,
            'M' => total_seconds += value * 60,
            'S' => total_seconds += value,
            _ => return None,
        }
    }
    if !number.is_empty() {
        return None;
    }

    Some(total_seconds / 60)
}

/// Builds a single-segment SFO to JFK offer for tests.
#[cfg(test)]
pub(crate) fn test_offer(
    id: &str,
    duration: &str,
    total: &str,
    dep: &str,
    arr: &str,
) -> FlightOffer {
    FlightOffer {
        id: id.to_string(),
        itineraries: vec![Itinerary {
            duration: duration.to_string(),
            segments: vec![Segment {
                departure: SegmentEndpoint {
                    iata_code: "SFO".into(),
                    at: dep.to_string(),
                },
                arrival: SegmentEndpoint {
                    iata_code: "JFK".into(),
                    at: arr.to_string(),
                },
                carrier_code: "UA".into(),
                number: "100".into(),
                duration: None,
            }],
        }],
        price: OfferPrice {
            currency: "INR".into(),
            total: total.to_string(),
        },
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use super::test_offer as offer;

    mod duration_parsing {
        use super::*;

        #[test]
        fn hours_and_minutes() {
            assert_eq!(parse_iso8601_duration_minutes("PT5H30M"), Some(330));
            assert_eq!(parse_iso8601_duration_minutes("PT4H10M"), Some(250));
            assert_eq!(parse_iso8601_duration_minutes("PT45M"), Some(45));
            assert_eq!(parse_iso8601_duration_minutes("PT2H"), Some(120));
        }

        #[test]
        fn days_and_seconds() {
            assert_eq!(parse_iso8601_duration_minutes("P1DT2H"), Some(1_560));
            assert_eq!(parse_iso8601_duration_minutes("PT1M30S"), Some(1));
        }

        #[test]
        fn malformed_inputs_fail() {
            assert_eq!(parse_iso8601_duration_minutes("5H30M"), None);
            assert_eq!(parse_iso8601_duration_minutes("PT5X"), None);
            assert_eq!(parse_iso8601_duration_minutes("PT5"), None);
            assert_eq!(parse_iso8601_duration_minutes(""), None);
        }
    }

    mod sorting {
        use super::*;

        fn minutes(offers: &[FlightOffer]) -> Vec<i64> {
            offers
                .iter()
                .map(|o| o.duration_minutes().unwrap())
                .collect()
        }

        #[test]
        fn duration_ascending() {
            let mut offers = vec![
                offer("a", "PT5H", "100", "2025-07-20T08:00:00", "2025-07-20T13:00:00"),
                offer("b", "PT4H30M", "90", "2025-07-20T09:00:00", "2025-07-20T13:30:00"),
                offer("c", "PT5H30M", "80", "2025-07-20T10:00:00", "2025-07-20T15:30:00"),
                offer("d", "PT4H10M", "120", "2025-07-20T11:00:00", "2025-07-20T15:10:00"),
                offer("e", "PT5H10M", "70", "2025-07-20T12:00:00", "2025-07-20T17:10:00"),
            ];
            SortKey::Duration.sort(&mut offers).unwrap();
            assert_eq!(minutes(&offers), vec![250, 270, 300, 310, 330]);
        }

        #[test]
        fn duration_sort_is_idempotent() {
            let mut offers = vec![
                offer("a", "PT5H", "100", "2025-07-20T08:00:00", "2025-07-20T13:00:00"),
                offer("b", "PT4H10M", "90", "2025-07-20T09:00:00", "2025-07-20T13:10:00"),
                offer("c", "PT5H30M", "80", "2025-07-20T10:00:00", "2025-07-20T15:30:00"),
            ];
            SortKey::Duration.sort(&mut offers).unwrap();
            let once = offers.clone();
            SortKey::Duration.sort(&mut offers).unwrap();
            assert_eq!(offers, once);
        }

        #[test]
        fn price_ascending() {
            let mut offers = vec![
                offer("a", "PT5H", "350.50", "2025-07-20T08:00:00", "2025-07-20T13:00:00"),
                offer("b", "PT5H", "120.00", "2025-07-20T09:00:00", "2025-07-20T14:00:00"),
                offer("c", "PT5H", "240.25", "2025-07-20T10:00:00", "2025-07-20T15:00:00"),
            ];
            SortKey::Price.sort(&mut offers).unwrap();
            let ids: Vec<&str> = offers.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(ids, vec!["b", "c", "a"]);
        }

        #[test]
        fn departure_and_arrival_time_ascending() {
            let mut offers = vec![
                offer("late", "PT5H", "1", "2025-07-20T18:00:00", "2025-07-20T23:00:00"),
                offer("early", "PT5H", "1", "2025-07-20T06:00:00", "2025-07-20T11:00:00"),
            ];
            SortKey::DepartureTime.sort(&mut offers).unwrap();
            assert_eq!(offers[0].id, "early");

            SortKey::ArrivalTime.sort(&mut offers).unwrap();
            assert_eq!(offers[0].id, "early");
        }

        #[test]
        fn missing_duration_reports_failure_and_preserves_order() {
            let mut offers = vec![
                offer("a", "PT5H", "100", "2025-07-20T08:00:00", "2025-07-20T13:00:00"),
                offer("b", "garbage", "90", "2025-07-20T09:00:00", "2025-07-20T14:00:00"),
            ];
            let err = SortKey::Duration.sort(&mut offers).unwrap_err();
            assert_eq!(err.index, 1);
            assert_eq!(offers[0].id, "a");
            assert_eq!(offers[1].id, "b");
        }
    }

    mod model {
        use super::*;

        #[test]
        fn unknown_provider_fields_survive_round_trip() {
            let raw = json!({
                "id": "1",
                "itineraries": [{
                    "duration": "PT5H",
                    "segments": [{
                        "departure": {"iataCode": "SFO", "at": "2025-07-20T08:00:00"},
                        "arrival": {"iataCode": "JFK", "at": "2025-07-20T13:00:00"},
                        "carrierCode": "UA",
                        "number": "100"
                    }]
                }],
                "price": {"currency": "USD", "total": "350.00"},
                "numberOfBookableSeats": 4
            });

            let parsed: FlightOffer = serde_json::from_value(raw).unwrap();
            assert_eq!(parsed.extra["numberOfBookableSeats"], 4);

            let back = serde_json::to_value(&parsed).unwrap();
            assert_eq!(back["numberOfBookableSeats"], 4);
            assert_eq!(back["price"]["total"], "350.00");
        }
    }
}

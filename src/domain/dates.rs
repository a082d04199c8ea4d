//! Date normalization.
//!
//! Turns free-form date phrases ("tomorrow", "next friday", "12/31/2025")
//! into canonical `YYYY-MM-DD` strings. Used by the conversation engine to
//! clean collected fields and by the flight-search validator for strict
//! date checks.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use tracing::warn;

/// Canonical output format for all normalized dates.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// Fixed input formats accepted in addition to relative phrases.
const INPUT_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y%m%d"];

/// Normalizes free-form date phrases into `YYYY-MM-DD` strings.
///
/// Unparseable input falls back to today's date rather than erroring: the
/// merge path must never fail on an odd value the model produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer;

impl DateNormalizer {
    /// Creates a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalizes `input` relative to the local calendar date.
    pub fn normalize(&self, input: &str) -> String {
        self.normalize_from(Local::now().date_naive(), input)
    }

    /// Normalizes `input` relative to an explicit base date.
    ///
    /// The base date is what "today" means; tests inject a fixed base so
    /// relative phrases resolve deterministically.
    pub fn normalize_from(&self, today: NaiveDate, input: &str) -> String {
        let trimmed = input.trim();

        if let Some(date) = self.parse_relative(today, trimmed) {
            return date.format(CANONICAL_FORMAT).to_string();
        }

        for fmt in INPUT_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
                return date.format(CANONICAL_FORMAT).to_string();
            }
        }

        warn!(input = trimmed, "could not parse date phrase, using today");
        today.format(CANONICAL_FORMAT).to_string()
    }

    fn parse_relative(&self, today: NaiveDate, input: &str) -> Option<NaiveDate> {
        let lower = input.to_lowercase();
        let phrase = lower.trim();

        match phrase {
            "today" | "now" => return Some(today),
            "tomorrow" => return Some(today + Duration::days(1)),
            "day after tomorrow" => return Some(today + Duration::days(2)),
            "yesterday" => return Some(today - Duration::days(1)),
            "next week" => return Some(today + Duration::days(7)),
            _ => {}
        }

        if let Some(rest) = phrase.strip_prefix("in ") {
            if let Some(days) = rest
                .strip_suffix(" days")
                .or_else(|| rest.strip_suffix(" day"))
            {
                if let Ok(n) = days.trim().parse::<i64>() {
                    return Some(today + Duration::days(n));
                }
            }
        }

        if let Some(rest) = phrase.strip_prefix("next ") {
            if let Some(weekday) = parse_weekday(rest.trim()) {
                return Some(next_weekday(today, weekday));
            }
        }

        if let Some(weekday) = parse_weekday(phrase) {
            return Some(next_weekday(today, weekday));
        }

        None
    }
}

/// Strict `YYYY-MM-DD` calendar-date check used by the flight validator.
///
/// Rejects loose shapes chrono would otherwise accept (e.g. `2025-7-2`).
pub fn is_valid_date(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(input, CANONICAL_FORMAT).is_ok()
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut diff = target - current;
    if diff <= 0 {
        diff += 7;
    }
    today + Duration::days(diff)
}

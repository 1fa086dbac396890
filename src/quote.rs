// Quote calculation: turns two date strings and a guest count into a priced stay
// Pure logic, no I/O. Safe to call from any number of request handlers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Wire format of every calendar date the widget exchanges with the backend
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Rate used until the backend configuration says otherwise
pub const DEFAULT_PRICE_PER_NIGHT: f64 = 150.0;

// Upper bound for a nightly rate; keeps `nights * rate` finite for any u32 night count
pub const MAX_PRICE_PER_NIGHT: f64 = 1_000_000.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Both check-in and check-out dates are required")]
    MissingDates,

    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    #[error("Check-out {checkout} must be after check-in {checkin}")]
    InvalidRange {
        checkin: NaiveDate,
        checkout: NaiveDate,
    },
}

/// Price of a single night. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NightlyRate(f64);

impl NightlyRate {
    /// Returns `None` for zero, negative, NaN, infinite or above
    /// `MAX_PRICE_PER_NIGHT` prices.
    pub fn new(price: f64) -> Option<Self> {
        (price.is_finite() && price > 0.0 && price <= MAX_PRICE_PER_NIGHT).then_some(Self(price))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for NightlyRate {
    fn default() -> Self {
        Self(DEFAULT_PRICE_PER_NIGHT)
    }
}

// Rates coming off the wire go through the same validation as NightlyRate::new
impl<'de> Deserialize<'de> for NightlyRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let price = f64::deserialize(deserializer)?;
        NightlyRate::new(price)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price per night: {price}")))
    }
}

/// A validated stay. Check-out is strictly after check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    checkin: NaiveDate,
    checkout: NaiveDate,
}

impl DateRange {
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> Result<Self, QuoteError> {
        if checkout <= checkin {
            return Err(QuoteError::InvalidRange { checkin, checkout });
        }
        Ok(Self { checkin, checkout })
    }

    /// Parses user input in the order: presence, format, ordering.
    ///
    /// Empty or whitespace-only input counts as missing.
    pub fn parse(checkin: Option<&str>, checkout: Option<&str>) -> Result<Self, QuoteError> {
        let (checkin, checkout) = match (non_blank(checkin), non_blank(checkout)) {
            (Some(checkin), Some(checkout)) => (checkin, checkout),
            _ => return Err(QuoteError::MissingDates),
        };

        let checkin = parse_date(checkin)?;
        let checkout = parse_date(checkout)?;
        Self::new(checkin, checkout)
    }

    pub fn checkin(&self) -> NaiveDate {
        self.checkin
    }

    pub fn checkout(&self) -> NaiveDate {
        self.checkout
    }

    /// Number of nights between check-in and check-out (always at least 1).
    pub fn nights(&self) -> u32 {
        // Calendar dates differ by whole days, so this is already the ceiling
        let days = (self.checkout - self.checkin).num_days().unsigned_abs();
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Every night of the stay, check-out day excluded.
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> {
        let checkout = self.checkout;
        self.checkin.iter_days().take_while(move |day| *day < checkout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub range: DateRange,
    pub nights: u32,
    pub guests: u32,
    pub price_per_night: NightlyRate,
    pub total: f64,
}

impl Quote {
    pub fn for_range(range: DateRange, guests: u32, rate: NightlyRate) -> Self {
        let nights = range.nights();
        Self {
            range,
            nights,
            guests,
            price_per_night: rate,
            total: f64::from(nights) * rate.get(),
        }
    }
}

/// Validates the raw date pair and prices the stay at `rate`.
pub fn compute_quote(
    checkin: Option<&str>,
    checkout: Option<&str>,
    guests: u32,
    rate: NightlyRate,
) -> Result<Quote, QuoteError> {
    let range = DateRange::parse(checkin, checkout)?;
    Ok(Quote::for_range(range, guests, rate))
}

pub fn parse_date(input: &str) -> Result<NaiveDate, QuoteError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| QuoteError::InvalidDateFormat(trimmed.to_string()))
}

fn non_blank(input: Option<&str>) -> Option<&str> {
    input.filter(|value| !value.trim().is_empty())
}

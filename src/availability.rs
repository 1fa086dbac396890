// Booked dates: the nights a guest can no longer pick
// Loaded once per session from the availability provider and never mutated afterwards.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::quote::{parse_date, DateRange, DATE_FORMAT};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BookedDates {
    dates: BTreeSet<NaiveDate>,
}

impl BookedDates {
    /// Builds the set from the provider's `YYYY-MM-DD` list.
    ///
    /// Entries that do not parse are skipped. Duplicates collapse.
    pub fn from_iso_strings<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dates = BTreeSet::new();
        let mut skipped = 0usize;

        for entry in entries {
            match parse_date(entry.as_ref()) {
                Ok(date) => {
                    dates.insert(date);
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(entry = entry.as_ref(), error = %err, "Skipping booked date");
                }
            }
        }

        if skipped > 0 {
            tracing::debug!(kept = dates.len(), skipped, "Parsed booked dates");
        }

        Self { dates }
    }

    /// Marks every night of every stay as booked.
    ///
    /// Calendar feeds report the check-out day as the end of a stay, and that
    /// day is free for the next arrival, so it is not included.
    pub fn from_stays<I>(stays: I) -> Self
    where
        I: IntoIterator<Item = DateRange>,
    {
        let dates = stays
            .into_iter()
            .flat_map(|stay| stay.nights_iter())
            .collect();
        Self { dates }
    }

    pub fn is_booked(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// First booked night in `[checkin, checkout)`, if any.
    pub fn first_conflict(&self, range: &DateRange) -> Option<NaiveDate> {
        self.dates
            .range(range.checkin()..range.checkout())
            .next()
            .copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Booked dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    pub fn to_iso_strings(&self) -> Vec<String> {
        self.iter()
            .map(|date| date.format(DATE_FORMAT).to_string())
            .collect()
    }
}

impl FromIterator<NaiveDate> for BookedDates {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

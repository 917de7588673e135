//! Narrowing a trip collection by month and day of week.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::BikeshareError;
use crate::model::{DayOfWeek, Month, TripRecord};

const ALL: &str = "all";

/// Month criterion: `all` or one canonical month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Only(Month),
}

impl MonthFilter {
    pub fn matches(self, month: Month) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == month,
        }
    }
}

impl Display for MonthFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(month) => f.write_str(&month.name().to_ascii_lowercase()),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = BikeshareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case(ALL) {
            Ok(Self::All)
        } else {
            value.parse().map(Self::Only)
        }
    }
}

/// Day-of-week criterion: `all` or one canonical day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayFilter {
    #[default]
    All,
    Only(DayOfWeek),
}

impl DayFilter {
    pub fn matches(self, day: DayOfWeek) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == day,
        }
    }
}

impl Display for DayFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(day) => f.write_str(&day.name().to_ascii_lowercase()),
        }
    }
}

impl FromStr for DayFilter {
    type Err = BikeshareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case(ALL) {
            Ok(Self::All)
        } else {
            value.parse().map(Self::Only)
        }
    }
}

/// The (month, weekday) pair a query is narrowed by.
///
/// Both halves are closed enumerations, so a value outside the canonical sets
/// can only come from raw text and is rejected by [`FilterCriteria::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub month: MonthFilter,
    pub weekday: DayFilter,
}

impl FilterCriteria {
    pub fn new(month: MonthFilter, weekday: DayFilter) -> Self {
        Self { month, weekday }
    }

    /// Validates raw month/day text, e.g. `("march", "all")`.
    ///
    /// # Errors
    ///
    /// Returns [`BikeshareError::InvalidCriteria`] naming the offending half.
    pub fn parse(month: &str, weekday: &str) -> Result<Self, BikeshareError> {
        Ok(Self {
            month: month.parse()?,
            weekday: weekday.parse()?,
        })
    }

    pub fn matches(&self, record: &TripRecord) -> bool {
        self.month.matches(record.month()) && self.weekday.matches(record.weekday())
    }
}

/// Keeps the records matching `criteria`, preserving their relative order.
///
/// The result borrows from the input, so it is always a subset of it. An empty
/// input, or criteria nothing matches, gives an empty vector.
pub fn filter_records<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a TripRecord>
where
    I: IntoIterator<Item = &'a TripRecord>,
{
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_criteria() {
        let criteria = FilterCriteria::parse("March", "ALL").unwrap();
        assert_eq!(criteria.month, MonthFilter::Only(Month::March));
        assert_eq!(criteria.weekday, DayFilter::All);
        assert_eq!(criteria.month.to_string(), "march");
    }

    #[test]
    fn test_parse_criteria_rejects_values_outside_the_sets() {
        let err = FilterCriteria::parse("all", "funday").unwrap_err();
        assert_eq!(
            err,
            BikeshareError::InvalidCriteria {
                kind: "day",
                value: "funday".to_string()
            }
        );
        assert!(FilterCriteria::parse("", "all").is_err());
    }

    #[test]
    fn test_filter_identity() {
        let records = year_of_trips();
        let filtered = filter_records(&records, &FilterCriteria::default());

        assert_eq!(filtered.len(), records.len());
        for (kept, original) in filtered.iter().zip(&records) {
            assert!(std::ptr::eq(*kept, original));
        }
    }

    #[test]
    fn test_filter_by_month_preserves_order() {
        let records = year_of_trips();
        let criteria = FilterCriteria::new(MonthFilter::Only(Month::March), DayFilter::All);
        let filtered = filter_records(&records, &criteria);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.month().number() == 3));
        assert!(filtered[0].start_time() < filtered[1].start_time());
        assert_eq!(filtered[0].start_station(), "station-3-a");
    }

    #[test]
    fn test_filter_by_month_and_day() {
        let records = year_of_trips();
        // 2017-03-01 was a Wednesday, 2017-03-15 too
        let criteria = FilterCriteria::parse("march", "wednesday").unwrap();
        assert_eq!(filter_records(&records, &criteria).len(), 2);

        let criteria = FilterCriteria::parse("march", "monday").unwrap();
        assert!(filter_records(&records, &criteria).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent_and_a_subset() {
        let records = year_of_trips();
        for criteria in [
            FilterCriteria::parse("june", "all").unwrap(),
            FilterCriteria::parse("all", "sunday").unwrap(),
            FilterCriteria::parse("december", "friday").unwrap(),
        ] {
            let once = filter_records(&records, &criteria);
            let twice = filter_records(once.iter().copied(), &criteria);
            assert_eq!(once, twice);
            assert!(
                once.iter()
                    .all(|kept| records.iter().any(|r| std::ptr::eq(*kept, r)))
            );
        }
    }

    #[test]
    fn test_filter_empty_input() {
        let records: Vec<TripRecord> = Vec::new();
        let criteria = FilterCriteria::parse("may", "tuesday").unwrap();
        assert!(filter_records(&records, &criteria).is_empty());
    }

    /// Two trips on the 1st and 15th of every month of 2017.
    fn year_of_trips() -> Vec<TripRecord> {
        let mut records = Vec::new();
        for month in 1..=12 {
            for (day, tag) in [(1, "a"), (15, "b")] {
                let start = NaiveDate::from_ymd_opt(2017, month, day)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap();
                let station = format!("station-{month}-{tag}");
                records.push(TripRecord::new(start, &station, "end", 600.0).unwrap());
            }
        }
        records
    }
}

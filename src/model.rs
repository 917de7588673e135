//! Typed trip records and the calendar enumerations derived from them.
//!
//! A [`TripRecord`] is validated once, when it is built from a [`RawTrip`] row,
//! and its derived month, weekday and hour are stored alongside it. Nothing
//! mutates a record after that.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::BikeshareError;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Calendar month, `January = 1` through `December = 12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    /// 1-based position in the canonical ordering.
    pub const fn number(self) -> u32 {
        self as u32
    }

    pub fn from_number(number: u32) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index as usize))
            .copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = BikeshareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|month| month.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BikeshareError::InvalidCriteria {
                kind: "month",
                value: value.to_owned(),
            })
    }
}

/// Day of the week. Parsed case-insensitively, displayed title-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl Display for DayOfWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = BikeshareError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BikeshareError::InvalidCriteria {
                kind: "day",
                value: value.to_owned(),
            })
    }
}

/// Fields derived from a trip's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFields {
    pub month: Month,
    pub weekday: DayOfWeek,
    pub hour: u32,
}

/// Derives month, weekday and hour from an already-parsed start time.
pub fn derive_time_fields(start_time: &NaiveDateTime) -> TimeFields {
    TimeFields {
        // chrono months are always 1..=12
        month: Month::from_number(start_time.month()).unwrap_or(Month::January),
        weekday: start_time.weekday().into(),
        hour: start_time.hour(),
    }
}

/// Parses a timestamp as written in the city files, e.g. `2017-06-23 15:09:32`.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, BikeshareError> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| BikeshareError::parse(0, field, format!("invalid timestamp `{value}`")))
}

/// One row of a city file, exactly as the CSV reader hands it over.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawTrip {
    #[serde(rename = "Start Time")]
    pub start_time: String,
    #[serde(rename = "End Time")]
    pub end_time: Option<String>,
    #[serde(rename = "Trip Duration")]
    pub trip_duration: String,
    #[serde(rename = "Start Station")]
    pub start_station: String,
    #[serde(rename = "End Station")]
    pub end_station: String,
    #[serde(rename = "User Type")]
    pub user_type: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Birth Year")]
    pub birth_year: Option<String>,
}

/// A single validated bicycle trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    start_station: String,
    end_station: String,
    trip_duration_seconds: f64,
    user_type: Option<String>,
    gender: Option<String>,
    birth_year: Option<i32>,
    time_fields: TimeFields,
}

impl TripRecord {
    /// Builds a record from its required fields, deriving the time fields once.
    pub fn new(
        start_time: NaiveDateTime,
        start_station: &str,
        end_station: &str,
        trip_duration_seconds: f64,
    ) -> Result<Self, BikeshareError> {
        if !trip_duration_seconds.is_finite() || trip_duration_seconds < 0.0 {
            return Err(BikeshareError::parse(
                0,
                "Trip Duration",
                format!("duration must be a non-negative number, got {trip_duration_seconds}"),
            ));
        }

        Ok(Self {
            start_time,
            end_time: None,
            start_station: required_label("Start Station", start_station)?,
            end_station: required_label("End Station", end_station)?,
            trip_duration_seconds,
            user_type: None,
            gender: None,
            birth_year: None,
            time_fields: derive_time_fields(&start_time),
        })
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_user_type(mut self, user_type: &str) -> Self {
        self.user_type = optional_label(Some(user_type));
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = optional_label(Some(gender));
        self
    }

    pub fn with_birth_year(mut self, birth_year: i32) -> Self {
        self.birth_year = Some(birth_year);
        self
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.end_time
    }

    pub fn start_station(&self) -> &str {
        &self.start_station
    }

    pub fn end_station(&self) -> &str {
        &self.end_station
    }

    pub fn trip_duration_seconds(&self) -> f64 {
        self.trip_duration_seconds
    }

    pub fn user_type(&self) -> Option<&str> {
        self.user_type.as_deref()
    }

    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_year
    }

    pub fn time_fields(&self) -> TimeFields {
        self.time_fields
    }

    pub fn month(&self) -> Month {
        self.time_fields.month
    }

    pub fn weekday(&self) -> DayOfWeek {
        self.time_fields.weekday
    }

    pub fn hour(&self) -> u32 {
        self.time_fields.hour
    }
}

impl TryFrom<RawTrip> for TripRecord {
    type Error = BikeshareError;

    fn try_from(raw: RawTrip) -> Result<Self, Self::Error> {
        let start_time = parse_timestamp("Start Time", &raw.start_time)?;
        let duration = parse_duration(&raw.trip_duration)?;

        let mut record = TripRecord::new(start_time, &raw.start_station, &raw.end_station, duration)?;

        if let Some(end_time) = optional_label(raw.end_time.as_deref()) {
            record.end_time = Some(parse_timestamp("End Time", &end_time)?);
        }
        record.user_type = optional_label(raw.user_type.as_deref());
        record.gender = optional_label(raw.gender.as_deref());
        if let Some(year) = optional_label(raw.birth_year.as_deref()) {
            record.birth_year = Some(parse_birth_year(&year)?);
        }

        Ok(record)
    }
}

fn required_label(field: &'static str, value: &str) -> Result<String, BikeshareError> {
    optional_label(Some(value)).ok_or_else(|| BikeshareError::parse(0, field, "empty station name"))
}

fn optional_label(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_duration(value: &str) -> Result<f64, BikeshareError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| BikeshareError::parse(0, "Trip Duration", format!("not a number: `{value}`")))
}

/// Birth years come through as floats in some files (`1992.0`).
fn parse_birth_year(value: &str) -> Result<i32, BikeshareError> {
    let invalid = || BikeshareError::parse(0, "Birth Year", format!("not a year: `{value}`"));

    let year = value.trim().parse::<f64>().map_err(|_| invalid())?;
    if year.fract() != 0.0 || !(0.0..=9999.0).contains(&year) {
        return Err(invalid());
    }
    Ok(year as i32)
}

//! Aggregate statistics over a (usually filtered) set of trips.
//!
//! Each family is a pure single pass over its input. Ties are broken
//! deterministically: the smallest month/hour/year wins, and names
//! (weekdays, stations, station pairs, categories) fall back to
//! alphabetical order.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::BikeshareError;
use crate::model::{DayOfWeek, Month, TripRecord};

/// Category used for trips that carry no user type or gender.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub popular_month: Month,
    pub month_count: usize,
    pub popular_day: DayOfWeek,
    pub day_count: usize,
    pub popular_hour: u32,
    pub hour_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationCount {
    pub station: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripCount {
    pub start_station: String,
    pub end_station: String,
    pub count: usize,
}

/// Most popular stations and start/end combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub popular_start: StationCount,
    pub popular_end: StationCount,
    pub popular_trip: TripCount,
}

/// A whole number of seconds split into days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationBreakdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationBreakdown {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    pub fn as_seconds(&self) -> u64 {
        self.days * SECONDS_PER_DAY
            + self.hours * SECONDS_PER_HOUR
            + self.minutes * SECONDS_PER_MINUTE
            + self.seconds
    }
}

impl Display for DurationBreakdown {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02} days {:02} hours {:02} minutes and {:02} seconds",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Total and mean trip duration.
///
/// Fractional seconds are truncated whenever a whole number of seconds is
/// needed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DurationStats {
    pub trip_count: usize,
    pub total_seconds: f64,
}

impl DurationStats {
    pub fn total_whole_seconds(&self) -> u64 {
        self.total_seconds.trunc() as u64
    }

    pub fn total(&self) -> DurationBreakdown {
        DurationBreakdown::from_seconds(self.total_whole_seconds())
    }

    /// Arithmetic mean in seconds.
    ///
    /// # Errors
    ///
    /// [`BikeshareError::EmptyInput`] when there were no trips.
    pub fn mean_seconds(&self) -> Result<f64, BikeshareError> {
        if self.trip_count == 0 {
            return Err(BikeshareError::EmptyInput {
                statistic: "mean trip duration",
            });
        }
        Ok(self.total_seconds / self.trip_count as f64)
    }

    pub fn mean(&self) -> Result<DurationBreakdown, BikeshareError> {
        let mean = self.mean_seconds()?;
        Ok(DurationBreakdown::from_seconds(mean.trunc() as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
    pub most_common_count: usize,
}

/// Counts per user type, plus gender and birth-year figures where the city
/// records them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UserStats {
    /// Sorted by descending count, then by name.
    pub user_types: Vec<CategoryCount>,
    /// `None` when no trip carries a gender.
    pub genders: Option<Vec<CategoryCount>>,
    /// `None` when no trip carries a birth year.
    pub birth_years: Option<BirthYearStats>,
}

impl UserStats {
    pub fn count_for(&self, user_type: &str) -> usize {
        self.user_types
            .iter()
            .find(|c| c.category == user_type)
            .map_or(0, |c| c.count)
    }
}

/// All four statistic families for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub trip_count: usize,
    pub time: Result<TimeStats, BikeshareError>,
    pub stations: Result<StationStats, BikeshareError>,
    pub durations: DurationStats,
    pub users: UserStats,
}

/// Runs every statistic family over `records`.
///
/// Families that are undefined on an empty input carry their
/// [`BikeshareError::EmptyInput`] in the result instead of failing the
/// whole computation.
#[tracing::instrument(skip_all, fields(trip_count = records.len()))]
pub fn compute_statistics(records: &[&TripRecord]) -> Statistics {
    Statistics {
        trip_count: records.len(),
        time: time_stats(records.iter().copied()),
        stations: station_stats(records.iter().copied()),
        durations: trip_duration_stats(records.iter().copied()),
        users: user_stats(records.iter().copied()),
    }
}

/// Most frequent month, weekday and start hour.
#[tracing::instrument(skip_all)]
pub fn time_stats<'a, I>(records: I) -> Result<TimeStats, BikeshareError>
where
    I: IntoIterator<Item = &'a TripRecord>,
{
    let mut months: HashMap<Month, usize> = HashMap::new();
    let mut days: HashMap<DayOfWeek, usize> = HashMap::new();
    let mut hours: HashMap<u32, usize> = HashMap::new();

    for record in records {
        let fields = record.time_fields();
        *months.entry(fields.month).or_default() += 1;
        *days.entry(fields.weekday).or_default() += 1;
        *hours.entry(fields.hour).or_default() += 1;
    }

    let empty = || BikeshareError::EmptyInput {
        statistic: "time of travel",
    };

    let (popular_month, month_count) = most_frequent(months).ok_or_else(empty)?;
    let ((_, popular_day), day_count) =
        most_frequent(days.into_iter().map(|(day, count)| ((day.name(), day), count)))
            .ok_or_else(empty)?;
    let (popular_hour, hour_count) = most_frequent(hours).ok_or_else(empty)?;

    Ok(TimeStats {
        popular_month,
        month_count,
        popular_day,
        day_count,
        popular_hour,
        hour_count,
    })
}

/// Most used start station, end station and (start, end) combination.
#[tracing::instrument(skip_all)]
pub fn station_stats<'a, I>(records: I) -> Result<StationStats, BikeshareError>
where
    I: IntoIterator<Item = &'a TripRecord>,
{
    let mut starts: HashMap<&str, usize> = HashMap::new();
    let mut ends: HashMap<&str, usize> = HashMap::new();
    let mut trips: HashMap<(&str, &str), usize> = HashMap::new();

    for record in records {
        *starts.entry(record.start_station()).or_default() += 1;
        *ends.entry(record.end_station()).or_default() += 1;
        *trips
            .entry((record.start_station(), record.end_station()))
            .or_default() += 1;
    }

    let empty = || BikeshareError::EmptyInput {
        statistic: "station popularity",
    };

    let (start, start_count) = most_frequent(starts).ok_or_else(empty)?;
    let (end, end_count) = most_frequent(ends).ok_or_else(empty)?;
    let ((trip_start, trip_end), trip_count) = most_frequent(trips).ok_or_else(empty)?;

    Ok(StationStats {
        popular_start: StationCount {
            station: start.to_string(),
            count: start_count,
        },
        popular_end: StationCount {
            station: end.to_string(),
            count: end_count,
        },
        popular_trip: TripCount {
            start_station: trip_start.to_string(),
            end_station: trip_end.to_string(),
            count: trip_count,
        },
    })
}

/// Total duration and trip count. Never fails; the mean is derived lazily.
#[tracing::instrument(skip_all)]
pub fn trip_duration_stats<'a, I>(records: I) -> DurationStats
where
    I: IntoIterator<Item = &'a TripRecord>,
{
    records
        .into_iter()
        .fold(DurationStats::default(), |mut acc, record| {
            acc.trip_count += 1;
            acc.total_seconds += record.trip_duration_seconds();
            acc
        })
}

#[tracing::instrument(skip_all)]
pub fn user_stats<'a, I>(records: I) -> UserStats
where
    I: IntoIterator<Item = &'a TripRecord>,
{
    let mut user_types: HashMap<&str, usize> = HashMap::new();
    let mut genders: HashMap<&str, usize> = HashMap::new();
    let mut years: HashMap<i32, usize> = HashMap::new();
    let mut any_gender = false;

    for record in records {
        *user_types
            .entry(record.user_type().unwrap_or(UNKNOWN_CATEGORY))
            .or_default() += 1;

        any_gender |= record.gender().is_some();
        *genders
            .entry(record.gender().unwrap_or(UNKNOWN_CATEGORY))
            .or_default() += 1;

        if let Some(year) = record.birth_year() {
            *years.entry(year).or_default() += 1;
        }
    }

    let birth_years = match (years.keys().min(), years.keys().max()) {
        (Some(&earliest), Some(&most_recent)) => {
            most_frequent(years.clone()).map(|(most_common, most_common_count)| BirthYearStats {
                earliest,
                most_recent,
                most_common,
                most_common_count,
            })
        }
        _ => None,
    };

    UserStats {
        user_types: ranked(user_types),
        genders: any_gender.then(|| ranked(genders)),
        birth_years,
    }
}

/// Highest count wins; among equal counts the smallest key wins.
fn most_frequent<K: Ord>(counts: impl IntoIterator<Item = (K, usize)>) -> Option<(K, usize)> {
    counts
        .into_iter()
        .max_by(|(a_key, a_count), (b_key, b_count)| {
            a_count.cmp(b_count).then_with(|| b_key.cmp(a_key))
        })
}

/// Descending count, then ascending name.
fn ranked(counts: HashMap<&str, usize>) -> Vec<CategoryCount> {
    let mut ranked: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    ranked
}

//! Rendering and persistence of computed statistics.
//!
//! Supports the console report, a JSON summary, and CSV append of the same
//! summary row.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::filter::FilterCriteria;
use crate::stats::{CategoryCount, Statistics};

const RULE_WIDTH: usize = 40;
const NO_TRIPS: &str = "No trips match the selected filters.";

/// One flat row summarising a query, suitable for CSV and JSON.
#[derive(Debug, Default, Serialize)]
pub struct SummaryRow {
    pub generated_at: DateTime<Utc>,
    pub city: String,
    pub month_filter: String,
    pub day_filter: String,
    pub trip_count: usize,
    pub skipped_records: usize,

    // time of travel
    pub popular_month: Option<String>,
    pub popular_day: Option<String>,
    pub popular_hour: Option<u32>,

    // stations
    pub popular_start_station: Option<String>,
    pub popular_start_count: Option<usize>,
    pub popular_end_station: Option<String>,
    pub popular_end_count: Option<usize>,
    pub popular_trip: Option<String>,
    pub popular_trip_count: Option<usize>,

    // durations, whole seconds
    pub total_duration_seconds: u64,
    pub mean_duration_seconds: Option<u64>,

    // users, `category=count` joined by `;`
    pub user_types: String,
    pub genders: Option<String>,
    pub earliest_birth_year: Option<i32>,
    pub most_recent_birth_year: Option<i32>,
    pub most_common_birth_year: Option<i32>,
}

impl SummaryRow {
    pub fn from_statistics(city: &str, criteria: &FilterCriteria, stats: &Statistics) -> Self {
        let mut row = SummaryRow {
            generated_at: Utc::now(),
            city: city.to_string(),
            month_filter: criteria.month.to_string(),
            day_filter: criteria.weekday.to_string(),
            trip_count: stats.trip_count,
            total_duration_seconds: stats.durations.total_whole_seconds(),
            mean_duration_seconds: stats.durations.mean().ok().map(|m| m.as_seconds()),
            user_types: join_counts(&stats.users.user_types),
            genders: stats.users.genders.as_deref().map(join_counts),
            ..Default::default()
        };

        if let Ok(time) = &stats.time {
            row.popular_month = Some(time.popular_month.to_string());
            row.popular_day = Some(time.popular_day.to_string());
            row.popular_hour = Some(time.popular_hour);
        }

        if let Ok(stations) = &stats.stations {
            row.popular_start_station = Some(stations.popular_start.station.clone());
            row.popular_start_count = Some(stations.popular_start.count);
            row.popular_end_station = Some(stations.popular_end.station.clone());
            row.popular_end_count = Some(stations.popular_end.count);
            row.popular_trip = Some(format!(
                "{} and {}",
                stations.popular_trip.start_station, stations.popular_trip.end_station
            ));
            row.popular_trip_count = Some(stations.popular_trip.count);
        }

        if let Some(years) = &stats.users.birth_years {
            row.earliest_birth_year = Some(years.earliest);
            row.most_recent_birth_year = Some(years.most_recent);
            row.most_common_birth_year = Some(years.most_common);
        }

        row
    }

    /// Records how many malformed rows the loader dropped.
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped_records = skipped;
        self
    }
}

fn join_counts(counts: &[CategoryCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{}={}", c.category, c.count))
        .collect::<Vec<_>>()
        .join(";")
}

/// Writes the sectioned, human-readable report.
pub fn write_report<W: Write>(out: &mut W, stats: &Statistics) -> Result<()> {
    let rule = "-".repeat(RULE_WIDTH);

    writeln!(out, "\nCalculating The Most Frequent Times of Travel...\n")?;
    match &stats.time {
        Ok(time) => {
            writeln!(
                out,
                "Most Frequent Start Month: {} ({} trips)",
                time.popular_month, time.month_count
            )?;
            writeln!(
                out,
                "Most Frequent Start Day: {} ({} trips)",
                time.popular_day, time.day_count
            )?;
            writeln!(
                out,
                "Most Frequent Start Hour: {} ({} trips)",
                time.popular_hour, time.hour_count
            )?;
        }
        Err(_) => writeln!(out, "{NO_TRIPS}")?,
    }
    writeln!(out, "{rule}")?;

    writeln!(out, "\nCalculating The Most Popular Stations and Trip...\n")?;
    match &stats.stations {
        Ok(stations) => {
            writeln!(
                out,
                "Most commonly used start station: {} with {} turns",
                stations.popular_start.station, stations.popular_start.count
            )?;
            writeln!(
                out,
                "Most commonly used end station: {} with {} turns",
                stations.popular_end.station, stations.popular_end.count
            )?;
            writeln!(
                out,
                "Most commonly used combined station: {} and {} with {} turns",
                stations.popular_trip.start_station,
                stations.popular_trip.end_station,
                stations.popular_trip.count
            )?;
        }
        Err(_) => writeln!(out, "{NO_TRIPS}")?,
    }
    writeln!(out, "{rule}")?;

    writeln!(out, "\nCalculating Trip Duration...\n")?;
    writeln!(out, "Total Trip Duration: {}", stats.durations.total())?;
    match stats.durations.mean() {
        Ok(mean) => writeln!(out, "Average Trip Duration: {mean}")?,
        Err(_) => writeln!(out, "Average Trip Duration: n/a ({NO_TRIPS})")?,
    }
    writeln!(out, "{rule}")?;

    writeln!(out, "\nCalculating User Stats...\n")?;
    if stats.users.user_types.is_empty() {
        writeln!(out, "{NO_TRIPS}")?;
    }
    for count in &stats.users.user_types {
        writeln!(out, "{:<12} {}", count.category, count.count)?;
    }
    if let Some(genders) = &stats.users.genders {
        writeln!(out)?;
        for count in genders {
            writeln!(out, "{:<12} {}", count.category, count.count)?;
        }
    }
    if let Some(years) = &stats.users.birth_years {
        writeln!(out)?;
        writeln!(out, "Earliest year of birth: {}", years.earliest)?;
        writeln!(out, "Most recent year of birth: {}", years.most_recent)?;
        writeln!(
            out,
            "Most common year of birth: {} ({} riders)",
            years.most_common, years.most_common_count
        )?;
    }
    writeln!(out, "{rule}")?;

    Ok(())
}

/// Logs a summary row using Rust's debug pretty-print format.
pub fn print_pretty(row: &SummaryRow) {
    debug!("{:#?}", row);
}

/// Writes a summary row as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, row: &SummaryRow) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(row)?)?;
    Ok(())
}

/// Appends a [`SummaryRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, row: &SummaryRow) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

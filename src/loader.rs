//! Reads a city's trip file into validated [`TripRecord`]s.
//!
//! Plain CSV and gzip-compressed CSV (`.gz`) are both accepted.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::BikeshareError;
use crate::model::{RawTrip, TripRecord};

const REQUIRED_COLUMNS: [&str; 4] = ["Start Time", "Trip Duration", "Start Station", "End Station"];

/// What to do with a row that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Drop the row, log it and keep going.
    #[default]
    Skip,
    /// Fail the whole load on the first bad row.
    Reject,
}

/// Records that made it through ingestion and how many rows were dropped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<TripRecord>,
    pub skipped: usize,
}

/// Opens `path` and reads every trip in it.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_city_file(path: &Path, policy: ParsePolicy) -> Result<LoadReport> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let reader: Box<dyn Read> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        debug!("Reading gzip-compressed trip file");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let report = read_trips(reader, policy)?;
    info!(
        records = report.records.len(),
        skipped = report.skipped,
        "Trip file loaded"
    );
    Ok(report)
}

/// Reads CSV trip rows from any reader.
///
/// Data rows are numbered from 1 in log lines and errors.
///
/// # Errors
///
/// Fails on unreadable input or missing required columns, and on the first
/// malformed row when `policy` is [`ParsePolicy::Reject`].
pub fn read_trips<R: Read>(reader: R, policy: ParsePolicy) -> Result<LoadReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            anyhow::bail!("trip file is missing the `{column}` column");
        }
    }

    let mut report = LoadReport::default();

    for (index, result) in rdr.deserialize::<RawTrip>().enumerate() {
        let line = index + 1;
        let parsed = result
            .map_err(|e| BikeshareError::parse(line, "record", e.to_string()))
            .and_then(|raw| TripRecord::try_from(raw).map_err(|e| e.at_line(line)));

        match parsed {
            Ok(record) => report.records.push(record),
            Err(e) => match policy {
                ParsePolicy::Reject => return Err(e.into()),
                ParsePolicy::Skip => {
                    warn!(line, error = %e, "Skipping malformed trip");
                    report.skipped += 1;
                }
            },
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;

    const SAMPLE: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1423854,2017-06-23 15:09:32,2017-06-23 15:14:53,321,Wood St & Hubbard St,Damen Ave & Chicago Ave,Subscriber,Male,1992.0
955915,2017-05-25 18:19:03,2017-05-25 18:45:53,1610,Theater on the Lake,Sheffield Ave & Waveland Ave,Subscriber,Female,1992.0
9031,2017-01-04 08:27:49,2017-01-04 08:34:45,416,May St & Taylor St,Wood St & Taylor St,Customer,,
";

    #[test]
    fn test_read_trips() {
        let report = read_trips(SAMPLE.as_bytes(), ParsePolicy::Skip).unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.records[2].user_type(), Some("Customer"));
        assert_eq!(report.records[2].gender(), None);
        assert_eq!(report.records[2].birth_year(), None);
    }

    #[test]
    fn test_read_trips_without_optional_columns() {
        let csv = "\
Start Time,End Time,Trip Duration,Start Station,End Station,User Type
2017-06-21 08:36:34,2017-06-21 08:44:43,489.066,14th & Belmont St NW,15th & K St NW,Subscriber
";
        let report = read_trips(csv.as_bytes(), ParsePolicy::Skip).unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].trip_duration_seconds(), 489.066);
        assert_eq!(report.records[0].gender(), None);
    }

    #[test]
    fn test_skip_policy_drops_bad_rows() {
        let csv = format!("{SAMPLE}1,not-a-date,,60,A,B,Customer,,\n2,2017-01-01 00:00:00,,abc,A,B,,,\n");
        let report = read_trips(csv.as_bytes(), ParsePolicy::Skip).unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_reject_policy_fails_with_line_number() {
        let csv = format!("{SAMPLE}1,not-a-date,,60,A,B,Customer,,\n");
        let err = read_trips(csv.as_bytes(), ParsePolicy::Reject).unwrap_err();

        let parse = err.downcast_ref::<BikeshareError>().unwrap();
        assert!(matches!(
            parse,
            BikeshareError::Parse {
                line: 4,
                field: "Start Time",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Start Time,Start Station,End Station\n2017-01-01 00:00:00,A,B\n";
        let err = read_trips(csv.as_bytes(), ParsePolicy::Skip).unwrap_err();
        assert!(err.to_string().contains("Trip Duration"));
    }

    #[test]
    fn test_load_city_file_plain_and_gzip() {
        let dir = std::env::temp_dir();
        let plain = dir.join("bikeshare_stats_test_plain.csv");
        let gzipped = dir.join("bikeshare_stats_test_gzip.csv.gz");

        fs::write(&plain, SAMPLE).unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        fs::write(&gzipped, encoder.finish().unwrap()).unwrap();

        let from_plain = load_city_file(&plain, ParsePolicy::Skip).unwrap();
        let from_gzip = load_city_file(&gzipped, ParsePolicy::Skip).unwrap();
        assert_eq!(from_plain.records, from_gzip.records);

        fs::remove_file(&plain).unwrap();
        fs::remove_file(&gzipped).unwrap();
    }

    #[test]
    fn test_load_city_file_missing() {
        let path = std::env::temp_dir().join("bikeshare_stats_does_not_exist.csv");
        assert!(load_city_file(&path, ParsePolicy::Skip).is_err());
    }
}

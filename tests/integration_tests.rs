use bikeshare_stats::config::CityCatalog;
use bikeshare_stats::error::BikeshareError;
use bikeshare_stats::filter::{FilterCriteria, filter_records};
use bikeshare_stats::loader::{LoadReport, ParsePolicy, load_city_file};
use bikeshare_stats::model::{DayOfWeek, Month, TripRecord};
use bikeshare_stats::stats::{DurationBreakdown, UNKNOWN_CATEGORY, compute_statistics};
use std::path::Path;

fn load_fixture() -> LoadReport {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/chicago_sample.csv");
    load_city_file(&path, ParsePolicy::Skip).expect("Failed to load fixture")
}

#[test]
fn test_full_pipeline_all_trips() {
    let report = load_fixture();
    assert_eq!(report.records.len(), 7);
    assert_eq!(report.skipped, 1);

    let filtered = filter_records(&report.records, &FilterCriteria::default());
    let stats = compute_statistics(&filtered);

    let time = stats.time.unwrap();
    assert_eq!(time.popular_month, Month::March);
    assert_eq!(time.month_count, 4);
    assert_eq!(time.popular_day, DayOfWeek::Monday);
    assert_eq!(time.popular_hour, 8);
    assert_eq!(time.hour_count, 4);

    let stations = stats.stations.unwrap();
    assert_eq!(stations.popular_start.station, "A");
    assert_eq!(stations.popular_start.count, 4);
    assert_eq!(stations.popular_end.station, "B");
    assert_eq!(stations.popular_end.count, 4);
    assert_eq!(stations.popular_trip.start_station, "A");
    assert_eq!(stations.popular_trip.end_station, "B");
    assert_eq!(stations.popular_trip.count, 3);

    assert_eq!(stats.durations.total_whole_seconds(), 3_801);
    assert_eq!(
        stats.durations.total(),
        DurationBreakdown {
            days: 0,
            hours: 1,
            minutes: 3,
            seconds: 21
        }
    );
    assert_eq!(stats.durations.mean().unwrap().as_seconds(), 543);

    assert_eq!(stats.users.count_for("Subscriber"), 4);
    assert_eq!(stats.users.count_for("Customer"), 2);
    assert_eq!(stats.users.count_for(UNKNOWN_CATEGORY), 1);

    let genders = stats.users.genders.unwrap();
    assert_eq!(genders[0].category, "Male");
    assert_eq!(genders[0].count, 3);

    let years = stats.users.birth_years.unwrap();
    assert_eq!(years.earliest, 1985);
    assert_eq!(years.most_recent, 1999);
    assert_eq!(years.most_common, 1985);
}

#[test]
fn test_full_pipeline_march_only() {
    let report = load_fixture();
    let criteria = FilterCriteria::parse("march", "all").unwrap();
    let filtered = filter_records(&report.records, &criteria);

    let stations: Vec<&str> = filtered.iter().map(|r| r.start_station()).collect();
    assert_eq!(stations, vec!["C", "A", "B", "A"]);
    assert!(filtered.iter().all(|r| r.month().number() == 3));

    let stats = compute_statistics(&filtered);
    // every pair occurs once; the alphabetically first pair wins
    let trip = stats.stations.unwrap().popular_trip;
    assert_eq!((trip.start_station.as_str(), trip.end_station.as_str()), ("A", "B"));
    assert_eq!(stats.durations.total_whole_seconds(), 2_580);
}

#[test]
fn test_full_pipeline_month_and_day() {
    let report = load_fixture();
    let criteria = FilterCriteria::parse("March", "MONDAY").unwrap();
    let filtered = filter_records(&report.records, &criteria);

    assert_eq!(filtered.len(), 2);
    let stats = compute_statistics(&filtered);
    assert_eq!(stats.time.unwrap().popular_day, DayOfWeek::Monday);
}

#[test]
fn test_full_pipeline_no_matches() {
    let report = load_fixture();
    let criteria = FilterCriteria::parse("december", "all").unwrap();
    let filtered: Vec<&TripRecord> = filter_records(&report.records, &criteria);

    assert!(filtered.is_empty());
    let stats = compute_statistics(&filtered);
    assert!(matches!(stats.time, Err(BikeshareError::EmptyInput { .. })));
    assert!(matches!(stats.stations, Err(BikeshareError::EmptyInput { .. })));
    assert_eq!(stats.durations.total_whole_seconds(), 0);
    assert!(matches!(
        stats.durations.mean(),
        Err(BikeshareError::EmptyInput { .. })
    ));
}

#[test]
fn test_strict_loading_rejects_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/chicago_sample.csv");
    let err = load_city_file(&path, ParsePolicy::Reject).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BikeshareError>(),
        Some(BikeshareError::Parse { line: 7, .. })
    ));
}

#[test]
fn test_catalog_points_at_fixture() {
    let catalog = CityCatalog::from_json(
        r#"{ "Chicago": "chicago_sample.csv" }"#,
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"),
    )
    .unwrap();

    let path = catalog.path_for("CHICAGO").unwrap();
    let report = load_city_file(&path, ParsePolicy::Skip).unwrap();
    assert_eq!(report.records.len(), 7);
}

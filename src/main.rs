//! CLI entry point for the bikeshare statistics tool.
//!
//! Provides an interactive explorer that asks for a city, month and day and
//! can be restarted, a one-shot report command, and a listing of the
//! configured cities.

use anyhow::{Context, Result};
use bikeshare_stats::{
    config::CityCatalog,
    filter::{DayFilter, FilterCriteria, MonthFilter, filter_records},
    loader::{ParsePolicy, load_city_file},
    output::{SummaryRow, append_record, print_pretty, write_json, write_report},
    prompt::{ask_restart, ask_selection},
    stats::{Statistics, compute_statistics},
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_stats")]
#[command(about = "Explore US bikeshare trip data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// JSON file mapping city names to data files (overrides the built-in cities)
    #[arg(long, value_name = "FILE")]
    cities: Option<String>,

    /// Fail on the first malformed trip instead of skipping it
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl DataArgs {
    fn policy(&self) -> ParsePolicy {
        if self.strict {
            ParsePolicy::Reject
        } else {
            ParsePolicy::Skip
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively pick a city, month and day, then show statistics
    Explore {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Compute statistics for one city and filter without prompting
    Report {
        /// City to analyze, e.g. "new york city"
        #[arg(short, long)]
        city: String,

        /// Month name, or "all"
        #[arg(short, long, default_value = "all")]
        month: MonthFilter,

        /// Day of week, or "all"
        #[arg(short, long, default_value = "all")]
        day: DayFilter,

        /// Print the summary as JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append the summary row to
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        data: DataArgs,
    },
    /// List the configured cities and their data files
    Cities {
        /// JSON file mapping city names to data files
        #[arg(long, value_name = "FILE")]
        cities: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    // Prompts share the terminal with stderr logs, so keep them quiet there.
    let stderr_level = match cli.command {
        Commands::Explore { .. } => "warn",
        _ => "info",
    };

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(stderr_level.parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    match cli.command {
        Commands::Explore { data } => {
            let catalog = CityCatalog::from_env(data.cities.as_deref())?;
            explore(&catalog, data.policy())?;
        }
        Commands::Report {
            city,
            month,
            day,
            json,
            output,
            data,
        } => {
            let catalog = CityCatalog::from_env(data.cities.as_deref())?;
            let city = catalog
                .resolve(&city)
                .with_context(|| format!("unknown city `{city}`"))?
                .to_string();
            let criteria = FilterCriteria::new(month, day);

            let (stats, skipped) = run_query(&catalog, &city, &criteria, data.policy())?;
            let row = SummaryRow::from_statistics(&city, &criteria, &stats).with_skipped(skipped);
            print_pretty(&row);

            let mut stdout = std::io::stdout().lock();
            if json {
                write_json(&mut stdout, &row)?;
            } else {
                write_report(&mut stdout, &stats)?;
            }

            if let Some(path) = output {
                append_record(&path, &row)?;
                info!(path = %path, "Summary appended");
            }
        }
        Commands::Cities { cities } => {
            let catalog = CityCatalog::from_env(cities.as_deref())?;
            let mut stdout = std::io::stdout().lock();
            for (city, _) in catalog.iter() {
                if let Some(path) = catalog.path_for(city) {
                    writeln!(stdout, "{city}: {}", path.display())?;
                }
            }
        }
    }

    Ok(())
}

/// Prompt, report, and ask to restart until the user declines or input ends.
fn explore(catalog: &CityCatalog, policy: ParsePolicy) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout().lock();

    loop {
        let Some(selection) = ask_selection(&mut input, &mut output, catalog)? else {
            break;
        };

        match run_query(catalog, &selection.city, &selection.criteria, policy) {
            Ok((stats, skipped)) => {
                if skipped > 0 {
                    writeln!(output, "Skipped {skipped} malformed trips.")?;
                }
                write_report(&mut output, &stats)?;
            }
            Err(e) => {
                error!(city = %selection.city, error = %e, "Query failed");
                writeln!(output, "Could not analyze {}: {e:#}", selection.city)?;
            }
        }

        if !ask_restart(&mut input, &mut output)? {
            break;
        }
    }

    Ok(())
}

/// Loads a city's trips, applies the criteria and computes every statistic.
#[tracing::instrument(skip(catalog, criteria), fields(month = %criteria.month, day = %criteria.weekday))]
fn run_query(
    catalog: &CityCatalog,
    city: &str,
    criteria: &FilterCriteria,
    policy: ParsePolicy,
) -> Result<(Statistics, usize)> {
    let path = catalog
        .path_for(city)
        .with_context(|| format!("unknown city `{city}`"))?;

    let report = load_city_file(&path, policy)?;
    let filtered = filter_records(&report.records, criteria);
    info!(
        loaded = report.records.len(),
        matched = filtered.len(),
        "Trips filtered"
    );

    Ok((compute_statistics(&filtered), report.skipped))
}

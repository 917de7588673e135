//! Interactive questions for the `explore` command.
//!
//! Every answer goes through a validate-or-reject function; the caller-side
//! loop in [`ask`] re-prompts until an answer is accepted or input runs out.

use anyhow::Result;
use std::fmt::Display;
use std::io::{BufRead, Write};

use crate::config::CityCatalog;
use crate::filter::{DayFilter, FilterCriteria, MonthFilter};

/// City and criteria chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub city: String,
    pub criteria: FilterCriteria,
}

/// Asks `question` until `validate` accepts the answer.
///
/// Returns `Ok(None)` when input is exhausted before a valid answer.
pub fn ask<R, W, T, E, F>(
    input: &mut R,
    output: &mut W,
    question: &str,
    validate: F,
) -> Result<Option<T>>
where
    R: BufRead,
    W: Write,
    E: Display,
    F: Fn(&str) -> Result<T, E>,
{
    loop {
        write!(output, "{question}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match validate(line.trim()) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => writeln!(output, "{e}. Please try again.")?,
        }
    }
}

/// Accepts a city present in `catalog`, returning its canonical name.
pub fn validate_city(catalog: &CityCatalog, answer: &str) -> Result<String, String> {
    catalog.resolve(answer).map(str::to_string).ok_or_else(|| {
        let known: Vec<&str> = catalog.iter().map(|(city, _)| city).collect();
        format!("Unknown city `{answer}` (choose one of: {})", known.join(", "))
    })
}

/// Collects city, month and day of week.
pub fn ask_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    catalog: &CityCatalog,
) -> Result<Option<Selection>> {
    writeln!(output, "Hello! Let's explore some US bikeshare data!")?;

    let Some(city) = ask(input, output, "Enter the city: ", |a| validate_city(catalog, a))? else {
        return Ok(None);
    };
    let Some(month) = ask(input, output, "Enter the month (or all): ", str::parse::<MonthFilter>)?
    else {
        return Ok(None);
    };
    let Some(weekday) = ask(input, output, "Enter the day of week (or all): ", str::parse::<DayFilter>)?
    else {
        return Ok(None);
    };

    writeln!(output, "{}", "-".repeat(40))?;
    Ok(Some(Selection {
        city,
        criteria: FilterCriteria::new(month, weekday),
    }))
}

/// Asks whether to run again. Only `yes` (any case) counts.
pub fn ask_restart<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<bool> {
    let answer = ask(
        input,
        output,
        "\nWould you like to restart? Enter yes or no.\n",
        |a| Ok::<_, String>(a.eq_ignore_ascii_case("yes")),
    )?;
    Ok(answer.unwrap_or(false))
}

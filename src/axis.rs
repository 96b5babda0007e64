//! X-axis normalization and axis titles.

use crate::error::{Error, Result};
use crate::models::{Table, Value, columns};
use chrono::{NaiveDate, Weekday};
use regex::Regex;
use std::sync::OnceLock;

/// Column names that hold a year-and-ISO-week composite.
const YEAR_WEEK_COLUMNS: &[&str] = &[columns::YEAR_WEEK, "YEAR_WOY"];

fn year_week_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-_ ]?[Ww]?(\d{1,2})$").expect("static year-week pattern")
    })
}

pub fn is_year_week_column(name: &str) -> bool {
    YEAR_WEEK_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Monday of the given ISO year-week, e.g. `2020-W05` -> 2020-01-27.
///
/// Accepts `2020-W05`, `2020W05`, `2020-05` and `202005`.
pub fn parse_year_week(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    let caps = year_week_re()
        .captures(s)
        .ok_or_else(|| Error::InvalidYearWeek(raw.to_string()))?;
    let year: i32 = caps[1]
        .parse()
        .map_err(|_| Error::InvalidYearWeek(raw.to_string()))?;
    let week: u32 = caps[2]
        .parse()
        .map_err(|_| Error::InvalidYearWeek(raw.to_string()))?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| Error::InvalidYearWeek(raw.to_string()))
}

/// Convert the x column to calendar dates when it is a year-week composite; any other
/// column passes through untouched.
pub fn normalize_x(table: &mut Table, x: &str) -> Result<()> {
    if !is_year_week_column(x) {
        return Ok(());
    }
    table.map_column(x, |v| match v {
        Value::Null | Value::Date(_) => Ok(v.clone()),
        other => parse_year_week(&other.to_string()).map(Value::Date),
    })
}

/// Axis title from a column name: `DOY_ZSCORE` -> `Doy Zscore`.
pub fn axis_label(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

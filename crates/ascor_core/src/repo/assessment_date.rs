//! Assessment date to lookup year derivation.
//!
//! Spreadsheet exports carry dates in several shapes: ISO dates or
//! date-times, day-first dates, bare years, or spreadsheet serial day
//! numbers. Anything else yields `None`.

use crate::model::table::CellValue;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const MIN_YEAR: i64 = 1000;
const MAX_YEAR: i64 = 9999;
// Largest serial accepted: 9999-12-31.
const MAX_SERIAL_DAY: i64 = 2_958_465;

/// Returns the calendar year of an assessment date cell.
pub fn assessment_year(value: Option<&CellValue>) -> Option<i32> {
    match value? {
        CellValue::Integer(number) => year_from_number(*number),
        CellValue::Real(number) if number.is_finite() && *number >= 0.0 => {
            // Fractional part is the time of day.
            year_from_number(number.trunc() as i64)
        }
        CellValue::Real(_) => None,
        CellValue::Text(text) => year_from_text(text.trim()),
    }
}

fn year_from_text(text: &str) -> Option<i32> {
    if text.is_empty() {
        return None;
    }
    if let Ok(number) = text.parse::<i64>() {
        return year_from_number(number);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.year());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.year());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.year());
        }
    }
    None
}

/// Interprets a number as a bare year or a spreadsheet serial day.
fn year_from_number(number: i64) -> Option<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&number) {
        return i32::try_from(number).ok();
    }
    if number > MAX_YEAR && number <= MAX_SERIAL_DAY {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        let days = u64::try_from(number).ok()?;
        return epoch.checked_add_days(Days::new(days)).map(|date| date.year());
    }
    None
}

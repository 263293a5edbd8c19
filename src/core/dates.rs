//! Lenient date handling for spreadsheet cells
//!
//! Dates are stored as opaque strings. They are only parsed when a report
//! needs to compare them, and a string that cannot be parsed is
//! "indeterminate" rather than an error.

use chrono::{Datelike, Duration, NaiveDate};

/// Excel serial dates count days from this epoch (the 1900 leap-year bug
/// shifts it back from 1900-01-01).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Plausible serial range, roughly years 1900-2064
const EXCEL_SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=60000.0;

/// Earliest year accepted from a `%Y` field; chrono also reads "25" as year 25
const MIN_FOUR_DIGIT_YEAR: i32 = 1000;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%d %b %Y",
    "%d %b %y",
    "%d %B %Y",
    "%Y.%m.%d",
];

/// Parse a free-form date string into a calendar date
///
/// Returns `None` for anything not recognised.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_excel_serial(s) {
        return Some(date);
    }

    for format in DATE_FORMATS {
        if let Some(date) = parse_with(s, format) {
            return Some(date);
        }
    }

    // ISO date-time ("2025-10-01T00:00:00", "2025-10-01 08:30"): use the date part
    if s.len() > 10 && s.is_char_boundary(10) {
        let (head, tail) = s.split_at(10);
        if tail.starts_with('T') || tail.starts_with(' ') {
            return parse_with(head, "%Y-%m-%d");
        }
    }

    None
}

/// Parse with one layout, refusing a short year in a `%Y` field so the
/// `%y` layouts get their turn
fn parse_with(s: &str, format: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s, format).ok()?;
    if format.contains("%Y") && date.year() < MIN_FOUR_DIGIT_YEAR {
        return None;
    }
    Some(date)
}

fn parse_excel_serial(s: &str) -> Option<NaiveDate> {
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let serial: f64 = s.parse().ok()?;
    if !EXCEL_SERIAL_RANGE.contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Monday and Sunday of the ISO week containing `reference`
pub fn iso_week_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = reference.weekday().num_days_from_monday() as i64;
    let start = reference - Duration::days(offset);
    (start, start + Duration::days(6))
}

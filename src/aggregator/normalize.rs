//! Per-row date and cost coercion
//!
//! A row whose date does not parse is dropped. A row whose cost does not
//! parse is kept with a cost of zero. [`RowOutcome`] names both cases so
//! callers never have to infer them from totals.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

use super::columns::ColumnRoles;
use crate::table::{Table, Value};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Text dates must spell the year with four digits
const MIN_TEXT_YEAR: i32 = 1000;

/// Largest spreadsheet serial day number (9999-12-31)
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
];

/// Month-and-year layouts ("Jan 2025"), parsed with a leading day of 1
const MONTH_YEAR_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y"];

/// What happened to a single row during normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOutcome {
    /// Date and cost both parsed
    Included { date: NaiveDate, cost: f64 },
    /// Date parsed, cost did not; the row counts as zero
    CostZeroed { date: NaiveDate },
    /// Date did not parse; the row is excluded from every output
    DroppedInvalidDate,
}

impl RowOutcome {
    /// The `(date, cost)` pair this row adds to its buckets, if any.
    pub fn contribution(&self) -> Option<(NaiveDate, f64)> {
        match *self {
            RowOutcome::Included { date, cost } => Some((date, cost)),
            RowOutcome::CostZeroed { date } => Some((date, 0.0)),
            RowOutcome::DroppedInvalidDate => None,
        }
    }
}

/// Classify one row from its raw date and cost cells.
pub fn normalize_row(date: &Value, cost: &Value) -> RowOutcome {
    let Some(date) = parse_date(date) else {
        return RowOutcome::DroppedInvalidDate;
    };
    match parse_cost(cost) {
        Some(cost) => RowOutcome::Included { date, cost },
        None => RowOutcome::CostZeroed { date },
    }
}

/// Classify every row of `table`, in row order.
pub fn normalize_table(table: &Table, roles: &ColumnRoles) -> Vec<RowOutcome> {
    table
        .rows()
        .iter()
        .map(|row| normalize_row(&row[roles.date.index], &row[roles.cost.index]))
        .collect()
}

/// Permissive calendar date parser.
///
/// Accepts common text layouts, compact `YYYYMMDD` integers and spreadsheet
/// serial day numbers. Any time of day is discarded.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let date = match value {
        Value::Null => None,
        Value::Number(n) => parse_numeric_date(*n),
        Value::Text(s) => parse_date_text(s),
    }?;

    (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(date)
}

fn parse_numeric_date(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() {
        return None;
    }

    if n.fract() == 0.0 && (10_000_101.0..=99_991_231.0).contains(&n) {
        return compact_ymd(n as u32);
    }

    if (1.0..=MAX_SERIAL_DAY).contains(&n) {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        return epoch.checked_add_days(Days::new(n.trunc() as u64));
    }

    None
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }

    // chrono lets a space in the format match nothing, so "Jan 2025" also
    // fits "%b %d %Y" as day 20 of year 25. Short years are never accepted.
    let four_digit_year = |date: &NaiveDate| date.year() >= MIN_TEXT_YEAR;

    if let Some(ts) = DATETIME_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .filter(|ts| four_digit_year(&ts.date()))
    }) {
        return Some(ts.date());
    }

    let first_of_month = format!("1 {}", s);
    if let Some(date) = MONTH_YEAR_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&first_of_month, fmt)
            .ok()
            .filter(four_digit_year)
    }) {
        return Some(date);
    }

    if let Some(date) = DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt).ok().filter(four_digit_year)
    }) {
        return Some(date);
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok().and_then(compact_ymd).filter(four_digit_year);
    }

    // Month-only values such as "2025-01" mean the first of the month.
    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        return NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .ok()
            .filter(four_digit_year);
    }

    None
}

fn compact_ymd(n: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt((n / 10_000) as i32, (n / 100) % 100, n % 100)
}

/// Numeric cost parser.
///
/// Text may carry a leading currency symbol and thousands separators.
/// Non-finite values are rejected.
pub fn parse_cost(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.is_finite().then_some(*n),
        Value::Text(s) => parse_cost_text(s),
    }
}

fn parse_cost_text(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s
        .strip_prefix(|c: char| matches!(c, '$' | '€' | '£'))
        .unwrap_or(s)
        .trim_start();
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    // ========== Dates ==========

    #[test]
    fn test_parse_date_text_formats() {
        let expected = ymd(2025, 1, 15);
        for raw in [
            "2025-01-15",
            " 2025-01-15 ",
            "2025/01/15",
            "01/15/2025",
            "15.01.2025",
            "20250115",
            "15 Jan 2025",
            "15 January 2025",
            "Jan 15, 2025",
            "January 15, 2025",
            "2025-01-15 13:45:00",
            "2025-01-15T13:45:00",
            "2025-01-15T13:45:00.123",
            "2025-01-15T13:45:00Z",
            "2025-01-15T13:45:00+02:00",
            "01/15/2025 01:45:00 PM",
        ] {
            assert_eq!(parse_date(&text(raw)), Some(expected), "failed to parse {:?}", raw);
        }
    }

    #[test]
    fn test_parse_date_month_only() {
        assert_eq!(parse_date(&text("2025-04")), Some(ymd(2025, 4, 1)));
    }

    #[test]
    fn test_parse_date_month_and_year() {
        assert_eq!(parse_date(&text("Jan 2025")), Some(ymd(2025, 1, 1)));
        assert_eq!(parse_date(&text("January 2025")), Some(ymd(2025, 1, 1)));
        assert_eq!(parse_date(&text(" Dec 2024 ")), Some(ymd(2024, 12, 1)));
        assert_eq!(parse_date(&text("September 2024")), Some(ymd(2024, 9, 1)));
    }

    #[test]
    fn test_parse_date_rejects_short_text_years() {
        for raw in ["Jan 20 25", "Jan 2 5", "15 Jan 25", "25-01-15", "1/15/25"] {
            assert_eq!(parse_date(&text(raw)), None, "{:?} parsed", raw);
        }
    }

    #[test]
    fn test_parse_date_compact_integer() {
        assert_eq!(parse_date(&Value::Number(20250115.0)), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date(&Value::Number(20251340.0)), None);
    }

    #[test]
    fn test_parse_date_spreadsheet_serial() {
        assert_eq!(parse_date(&Value::Number(45672.0)), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date(&Value::Number(45672.75)), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date(&Value::Number(1.0)), Some(ymd(1899, 12, 31)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for value in [
            Value::Null,
            text(""),
            text("not a date"),
            text("2025-13-01"),
            text("2025-02-30"),
            Value::Number(0.0),
            Value::Number(-5.0),
            Value::Number(f64::NAN),
            Value::Number(5_000_000.0),
        ] {
            assert_eq!(parse_date(&value), None, "unexpectedly parsed {:?}", value);
        }
    }

    // ========== Costs ==========

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost(&Value::Number(10.5)), Some(10.5));
        assert_eq!(parse_cost(&text("10.5")), Some(10.5));
        assert_eq!(parse_cost(&text(" -3 ")), Some(-3.0));
        assert_eq!(parse_cost(&text("$1,234.50")), Some(1234.5));
        assert_eq!(parse_cost(&text("€ 7")), Some(7.0));
    }

    #[test]
    fn test_parse_cost_rejects_non_numbers() {
        assert_eq!(parse_cost(&Value::Null), None);
        assert_eq!(parse_cost(&text("n/a")), None);
        assert_eq!(parse_cost(&text("")), None);
        assert_eq!(parse_cost(&text("NaN")), None);
        assert_eq!(parse_cost(&Value::Number(f64::INFINITY)), None);
    }

    // ========== Row outcomes ==========

    #[test]
    fn test_normalize_row_outcomes() {
        assert_eq!(
            normalize_row(&text("2025-01-15"), &Value::Number(10.0)),
            RowOutcome::Included {
                date: ymd(2025, 1, 15),
                cost: 10.0
            }
        );
        assert_eq!(
            normalize_row(&text("2025-01-15"), &text("free")),
            RowOutcome::CostZeroed {
                date: ymd(2025, 1, 15)
            }
        );
        assert_eq!(
            normalize_row(&text("someday"), &Value::Number(10.0)),
            RowOutcome::DroppedInvalidDate
        );
        assert_eq!(
            normalize_row(&Value::Null, &text("free")),
            RowOutcome::DroppedInvalidDate
        );
    }

    #[test]
    fn test_contribution() {
        let date = ymd(2025, 2, 1);
        assert_eq!(RowOutcome::Included { date, cost: 2.0 }.contribution(), Some((date, 2.0)));
        assert_eq!(RowOutcome::CostZeroed { date }.contribution(), Some((date, 0.0)));
        assert_eq!(RowOutcome::DroppedInvalidDate.contribution(), None);
    }
}

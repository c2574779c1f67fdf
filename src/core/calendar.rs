//! Calendar helpers for pro-rata allocation.

use super::error::{CalcError, CalcResult};
use chrono::{Datelike, NaiveDate};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Days from `date` to 31 December inclusive.
pub fn days_remaining_in_year(date: NaiveDate) -> u32 {
    days_in_year(date.year()) - date.ordinal() + 1
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_iso_date(field: &str, value: &str) -> CalcResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        CalcError::validation(field, format!("expected YYYY-MM-DD, got '{value}' ({e})"))
    })
}

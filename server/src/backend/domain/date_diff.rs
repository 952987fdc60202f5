//! Calendar difference between two dates in whole years, months and days.
//!
//! Used for member tenure and age. The month borrow walks backwards from the
//! end date one month at a time, so a start day that does not exist in the
//! preceding month (Jan 31 → Mar 1) still yields a non-negative day count.

use chrono::{DateTime, Datelike, Local, NaiveDate};

pub use shared::DateDifference;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateDiffError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Parse a `YYYY-MM-DD` date or an RFC 3339 timestamp
pub fn parse_date(value: &str) -> Result<NaiveDate, DateDiffError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| DateDiffError::InvalidDate(value.to_string()))
}

/// Number of days in `month` of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Year and month `back` months before `year`/`month`
fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Difference from `start` to `end`
pub fn date_difference(start: NaiveDate, end: NaiveDate) -> Result<DateDifference, DateDiffError> {
    if end < start {
        return Err(DateDiffError::EndBeforeStart { start, end });
    }

    let mut years = end.year() - start.year();
    let mut months = end.month() as i32 - start.month() as i32;
    let mut days = end.day() as i32 - start.day() as i32;

    let mut back = 1;
    while days < 0 {
        let (year, month) = months_before(end.year(), end.month(), back);
        days += days_in_month(year, month) as i32;
        months -= 1;
        back += 1;
    }

    while months < 0 {
        years -= 1;
        months += 12;
    }

    Ok(DateDifference {
        years,
        months: months as u32,
        days: days as u32,
    })
}

/// Difference between two date strings
pub fn date_difference_from_str(start: &str, end: &str) -> Result<DateDifference, DateDiffError> {
    date_difference(parse_date(start)?, parse_date(end)?)
}

/// Difference from `start` until the local current date
pub fn date_difference_until_today(start: NaiveDate) -> Result<DateDifference, DateDiffError> {
    date_difference(start, Local::now().date_naive())
}

/// Whole years elapsed from `start` to `end`; 0 when `end` precedes `start`
pub fn whole_years_between(start: NaiveDate, end: NaiveDate) -> u32 {
    date_difference(start, end)
        .map(|diff| diff.years.max(0) as u32)
        .unwrap_or(0)
}

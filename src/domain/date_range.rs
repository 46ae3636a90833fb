use crate::error::{PtoError, PtoResult};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Serialize;
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive span of calendar days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PtoResult<Self> {
        if start > end {
            return Err(PtoError::validation(
                "Start date must not be greater than end date",
            ));
        }
        Ok(Self { start, end })
    }

    /// The whole of the given month, or `None` if the year/month does not exist.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }?
        .pred_opt()?;

        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// True when the two ranges share at least one calendar day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start.format(DATE_FORMAT))
        } else {
            write!(
                f,
                "{} - {}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }
}

/// Parses a calendar day from either `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps are what older exports contain. They name an instant, so the day
/// is the one that instant falls on in local time.
pub fn parse_day(input: &str) -> PtoResult<NaiveDate> {
    parse_day_in(input, &Local)
}

fn parse_day_in<Tz: TimeZone>(input: &str, zone: &Tz) -> PtoResult<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|timestamp| timestamp.with_timezone(zone).date_naive())
        .map_err(|_| PtoError::validation(format!("Invalid date: '{input}'")))
}

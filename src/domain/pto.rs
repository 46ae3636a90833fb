use crate::domain::{DateRange, EmployeeId};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Storage-assigned identifier of a PTO record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PtoKey(pub i64);

impl fmt::Display for PtoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A PTO interval about to be stored; the key is assigned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPto {
    pub employee_id: EmployeeId,
    pub span: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PtoInterval {
    pub key: PtoKey,
    pub employee_id: EmployeeId,
    pub span: DateRange,
}

impl PtoInterval {
    pub fn start(&self) -> NaiveDate {
        self.span.start()
    }

    pub fn end(&self) -> NaiveDate {
        self.span.end()
    }

    pub fn bucket(&self, today: NaiveDate) -> Bucket {
        classify(&self.span, today)
    }

    pub fn season(&self) -> Season {
        season_of(self.span.start())
    }

    /// "March 4, 2024 - March 8, 2024", or a single date for one-day leave.
    pub fn label(&self) -> String {
        if self.span.is_single_day() {
            long_date(self.start())
        } else {
            format!("{} - {}", long_date(self.start()), long_date(self.end()))
        }
    }
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Past,
    Current,
    Upcoming,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Past, Bucket::Current, Bucket::Upcoming];

    pub fn title(&self) -> &'static str {
        match self {
            Bucket::Past => "Past PTO",
            Bucket::Current => "Current PTO",
            Bucket::Upcoming => "Upcoming PTO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        };
        f.write_str(name)
    }
}

/// First interval of `employee_id` in `existing` sharing a day with `candidate`.
pub fn find_conflict<'a>(
    employee_id: EmployeeId,
    candidate: &DateRange,
    existing: &'a [PtoInterval],
) -> Option<&'a PtoInterval> {
    existing
        .iter()
        .filter(|interval| interval.employee_id == employee_id)
        .find(|interval| candidate.overlaps(&interval.span))
}

pub fn has_conflict(
    employee_id: EmployeeId,
    candidate: &DateRange,
    existing: &[PtoInterval],
) -> bool {
    find_conflict(employee_id, candidate, existing).is_some()
}

/// Bucket of `span` relative to `today`. Current needs today strictly inside the range;
/// a range that starts or ends today falls through to upcoming.
pub fn classify(span: &DateRange, today: NaiveDate) -> Bucket {
    if span.end() < today {
        Bucket::Past
    } else if span.start() < today && span.end() > today {
        Bucket::Current
    } else {
        Bucket::Upcoming
    }
}

pub fn season_of(date: NaiveDate) -> Season {
    match date.month() {
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        9..=11 => Season::Autumn,
        _ => Season::Winter,
    }
}

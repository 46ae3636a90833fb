use crate::domain::DateRange;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const GRID_ROWS: usize = 6;
pub const GRID_COLUMNS: usize = 7;
pub const WEEKDAY_LABELS: [&str; GRID_COLUMNS] =
    ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// The (year, month) a calendar is showing. Month is 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Anchor {
    pub year: i32,
    pub month: u32,
}

/// One month of navigation. No other deltas exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
}

impl Anchor {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn advance(self, step: Step) -> Self {
        match step {
            Step::Back if self.month == 1 => Self {
                year: self.year - 1,
                month: 12,
            },
            Step::Back => Self {
                year: self.year,
                month: self.month - 1,
            },
            Step::Forward if self.month == 12 => Self {
                year: self.year + 1,
                month: 1,
            },
            Step::Forward => Self {
                year: self.year,
                month: self.month + 1,
            },
        }
    }

    /// Composes a date from this anchor and `day`. Days outside the month yield `None`.
    pub fn select(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn days_in_month(self) -> u32 {
        DateRange::month(self.year, self.month)
            .map(|range| range.end().day())
            .unwrap_or(0)
    }

    /// "February 2024"
    pub fn title(self) -> String {
        match self.select(1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => format!("{}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for Anchor {
    type Err = String;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in '{s}'"))?;
        Anchor::new(year, month).ok_or_else(|| format!("month out of range in '{s}'"))
    }
}

/// How the weekday of the 1st is turned into leading blank cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekdayIndexing {
    /// Monday = 0 .. Sunday = 6.
    #[default]
    Iso,
    /// Sunday-based index minus one with no wrap, so a month starting on
    /// Sunday gets no leading blanks and its 1st lands under Monday.
    Legacy,
}

impl WeekdayIndexing {
    fn leading_blanks(self, first: NaiveDate) -> usize {
        match self {
            WeekdayIndexing::Iso => first.weekday().num_days_from_monday() as usize,
            WeekdayIndexing::Legacy => {
                let index = first.weekday().num_days_from_sunday() as i64 - 1;
                index.max(0) as usize
            }
        }
    }
}

impl FromStr for WeekdayIndexing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iso" => Ok(WeekdayIndexing::Iso),
            "legacy" => Ok(WeekdayIndexing::Legacy),
            other => Err(format!("unknown weekday indexing '{other}' (expected iso or legacy)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cell {
    pub day: Option<u32>,
    pub is_today: bool,
}

#[cfg(test)]
impl Cell {
    fn is_blank(&self) -> bool {
        self.day.is_none()
    }
}

/// Six Monday-first weeks covering one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub anchor: Anchor,
    pub cells: [[Cell; GRID_COLUMNS]; GRID_ROWS],
}

impl MonthGrid {
    pub fn build(anchor: Anchor, today: NaiveDate, indexing: WeekdayIndexing) -> Self {
        let mut cells = [[Cell::default(); GRID_COLUMNS]; GRID_ROWS];
        let Some(first) = anchor.select(1) else {
            return Self { anchor, cells };
        };

        let days_in_month = anchor.days_in_month();
        let offset = indexing.leading_blanks(first);

        for day in 1..=days_in_month {
            let slot = offset + day as usize - 1;
            let (row, column) = (slot / GRID_COLUMNS, slot % GRID_COLUMNS);
            if row >= GRID_ROWS {
                break;
            }
            cells[row][column] = Cell {
                day: Some(day),
                is_today: anchor.select(day) == Some(today),
            };
        }

        Self { anchor, cells }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; GRID_COLUMNS]> {
        self.cells.iter()
    }
}

#[cfg(test)]
impl MonthGrid {
    /// (row, column) of `day`, if it is on the grid.
    fn position_of(&self, day: u32) -> Option<(usize, usize)> {
        self.cells.iter().enumerate().find_map(|(row, cells)| {
            cells
                .iter()
                .position(|cell| cell.day == Some(day))
                .map(|column| (row, column))
        })
    }

    fn filled(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_blank())
            .count()
    }

    fn today(&self) -> Option<u32> {
        self.cells
            .iter()
            .flatten()
            .find(|cell| cell.is_today)
            .and_then(|cell| cell.day)
    }
}

pub fn grid(anchor: Anchor, today: NaiveDate, indexing: WeekdayIndexing) -> MonthGrid {
    MonthGrid::build(anchor, today, indexing)
}

/// Navigation and selection state of one calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    anchor: Anchor,
    selected: Option<NaiveDate>,
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            anchor: Anchor::of(today),
            selected: None,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn advance(&mut self, step: Step) -> Anchor {
        self.anchor = self.anchor.advance(step);
        self.anchor
    }

    /// Selects `day` of the shown month. A day outside the month leaves the selection unchanged.
    pub fn select(&mut self, day: u32) -> Option<NaiveDate> {
        let date = self.anchor.select(day)?;
        self.selected = Some(date);
        Some(date)
    }

    pub fn reset(&mut self, today: NaiveDate) {
        self.anchor = Anchor::of(today);
        self.selected = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    Navigate(Step),
    Select(u32),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarEvent {
    pub calendar: CalendarId,
    pub action: CalendarAction,
}

impl CalendarEvent {
    pub fn new(calendar: CalendarId, action: CalendarAction) -> Self {
        Self { calendar, action }
    }
}

/// Calendar instances addressed by id; events are routed to the instance they name.
#[derive(Debug, Clone, Default)]
pub struct CalendarSet {
    calendars: Vec<CalendarState>,
}

impl CalendarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, today: NaiveDate) -> CalendarId {
        self.calendars.push(CalendarState::new(today));
        CalendarId(self.calendars.len() - 1)
    }

    pub fn get(&self, id: CalendarId) -> Option<&CalendarState> {
        self.calendars.get(id.0)
    }

    /// Applies `event` to its calendar. Unknown ids are ignored and yield `None`.
    pub fn dispatch(&mut self, event: CalendarEvent, today: NaiveDate) -> Option<&CalendarState> {
        let calendar = self.calendars.get_mut(event.calendar.0)?;
        match event.action {
            CalendarAction::Navigate(step) => {
                calendar.advance(step);
            }
            CalendarAction::Select(day) => {
                calendar.select(day);
            }
            CalendarAction::Reset => calendar.reset(today),
        }
        Some(calendar)
    }

    pub fn reset_all(&mut self, today: NaiveDate) {
        for calendar in &mut self.calendars {
            calendar.reset(today);
        }
    }
}

use super::theme::Theme;
use crate::domain::{
    Anchor, CalendarAction, CalendarEvent, CalendarId, CalendarSet, Step, WEEKDAY_LABELS,
    WeekdayIndexing,
};
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::tty::IsTty;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{self, Stdout, stdout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Picked { start: NaiveDate, end: NaiveDate },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
}

impl Field {
    fn index(self) -> usize {
        match self {
            Field::Start => 0,
            Field::End => 1,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Start => "Start date",
            Field::End => "End date",
        }
    }

    fn other(self) -> Self {
        match self {
            Field::Start => Field::End,
            Field::End => Field::Start,
        }
    }
}

/// Start and end calendars plus a day cursor; all changes go through `CalendarSet::dispatch`.
#[derive(Debug, Clone)]
pub struct PickerState {
    calendars: CalendarSet,
    ids: [CalendarId; 2],
    cursors: [u32; 2],
    focus: Field,
    today: NaiveDate,
    outcome: Option<PickerOutcome>,
}

impl PickerState {
    pub fn new(today: NaiveDate) -> Self {
        let mut calendars = CalendarSet::new();
        let ids = [calendars.open(today), calendars.open(today)];
        Self {
            calendars,
            ids,
            cursors: [today.day(); 2],
            focus: Field::Start,
            today,
            outcome: None,
        }
    }

    /// A picker with `start` and `end` already chosen where given. Each calendar opens on
    /// its preset month, and focus lands on the first field still missing.
    pub fn with_dates(
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        let mut state = Self::new(today);
        for (field, preset) in [(Field::Start, start), (Field::End, end)] {
            if let Some(date) = preset {
                state.preselect(field, date);
            }
        }
        if start.is_some() && end.is_none() {
            state.focus = Field::End;
        }
        state
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn outcome(&self) -> Option<PickerOutcome> {
        self.outcome
    }

    pub fn anchor(&self, field: Field) -> Anchor {
        self.calendars
            .get(self.ids[field.index()])
            .map(|calendar| calendar.anchor())
            .unwrap_or_else(|| Anchor::of(self.today))
    }

    pub fn selected(&self, field: Field) -> Option<NaiveDate> {
        self.calendars
            .get(self.ids[field.index()])
            .and_then(|calendar| calendar.selected())
    }

    pub fn cursor(&self, field: Field) -> u32 {
        self.cursors[field.index()]
    }

    fn send(&mut self, field: Field, action: CalendarAction) {
        let event = CalendarEvent::new(self.ids[field.index()], action);
        self.calendars.dispatch(event, self.today);
    }

    fn preselect(&mut self, field: Field, date: NaiveDate) {
        let from = self.anchor(field);
        let months = (date.year() - from.year) * 12 + date.month() as i32 - from.month as i32;
        let step = if months < 0 { Step::Back } else { Step::Forward };
        for _ in 0..months.unsigned_abs() {
            self.send(field, CalendarAction::Navigate(step));
        }
        self.send(field, CalendarAction::Select(date.day()));
        self.cursors[field.index()] = date.day();
    }

    fn clamp_cursor(&mut self, field: Field) {
        let last = self.anchor(field).days_in_month();
        let cursor = &mut self.cursors[field.index()];
        *cursor = (*cursor).min(last);
    }

    /// Moves the cursor by whole days, following it into the neighbouring month.
    fn move_cursor(&mut self, days: i64) {
        let field = self.focus;
        let anchor = self.anchor(field);
        let Some(current) = anchor.select(self.cursor(field)) else {
            return;
        };
        let target = current + Duration::days(days);

        if Anchor::of(target) != anchor {
            let step = if target < current { Step::Back } else { Step::Forward };
            self.send(field, CalendarAction::Navigate(step));
        }
        self.cursors[field.index()] = target.day();
    }

    fn page(&mut self, step: Step) {
        self.send(self.focus, CalendarAction::Navigate(step));
        self.clamp_cursor(self.focus);
    }

    fn confirm(&mut self) {
        let field = self.focus;
        self.send(field, CalendarAction::Select(self.cursor(field)));

        match (self.selected(Field::Start), self.selected(Field::End)) {
            (Some(start), Some(end)) => {
                self.outcome = Some(PickerOutcome::Picked { start, end });
            }
            _ => self.focus = field.other(),
        }
    }

    fn reset(&mut self) {
        self.calendars.reset_all(self.today);
        self.cursors = [self.today.day(); 2];
        self.focus = Field::Start;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
                self.outcome = Some(PickerOutcome::Cancelled);
            }
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                self.outcome = Some(PickerOutcome::Cancelled);
            }

            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => self.move_cursor(-1),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => self.move_cursor(1),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => self.move_cursor(-7),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => self.move_cursor(7),

            (KeyCode::PageUp, _) | (KeyCode::Char('['), _) => self.page(Step::Back),
            (KeyCode::PageDown, _) | (KeyCode::Char(']'), _) => self.page(Step::Forward),

            (KeyCode::Char('t'), _) => {
                self.send(self.focus, CalendarAction::Reset);
                self.cursors[self.focus.index()] = self.today.day();
            }
            (KeyCode::Char('r'), _) => self.reset(),

            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => self.focus = self.focus.other(),
            (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => self.confirm(),
            _ => {}
        }
    }
}

/// Full-screen two-calendar date range picker.
pub struct RangePicker {
    state: PickerState,
    weekdays: WeekdayIndexing,
    theme: Theme,
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl RangePicker {
    pub fn new(state: PickerState, weekdays: WeekdayIndexing, theme: Theme) -> io::Result<Self> {
        if !IsTty::is_tty(&stdout()) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "Not running in a TTY, cannot open the date picker",
            ));
        }

        enable_raw_mode()
            .map_err(|e| io::Error::other(format!("Failed to enable raw mode: {e}")))?;

        stdout().execute(EnterAlternateScreen).map_err(|e| {
            let _ = disable_raw_mode();
            io::Error::other(format!("Failed to enter alternate screen: {e}"))
        })?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout())).map_err(|e| {
            let _ = disable_raw_mode();
            let _ = stdout().execute(LeaveAlternateScreen);
            io::Error::other(format!("Failed to create terminal: {e}"))
        })?;

        Ok(Self {
            state,
            weekdays,
            theme,
            terminal,
        })
    }

    pub fn run(&mut self) -> io::Result<PickerOutcome> {
        let outcome = loop {
            if let Some(outcome) = self.state.outcome() {
                break outcome;
            }

            let state = &self.state;
            let weekdays = self.weekdays;
            let theme = &self.theme;
            self.terminal.draw(|frame| {
                let area = centered(frame.area(), 66, 14);
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(11), Constraint::Length(3)])
                    .split(area);
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(rows[0]);

                for (field, column) in [(Field::Start, columns[0]), (Field::End, columns[1])] {
                    frame.render_widget(month_table(state, field, weekdays, theme), column);
                }
                frame.render_widget(status_line(state, theme), rows[1]);
            })?;

            if poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.state.handle_key(key);
                    }
                }
            }
        };

        self.cleanup()?;
        Ok(outcome)
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        Ok(())
    }
}

impl Drop for RangePicker {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn centered(available: Rect, width: u16, height: u16) -> Rect {
    let width = available.width.min(width);
    let height = available.height.min(height);
    Rect {
        x: available.x + (available.width - width) / 2,
        y: available.y + (available.height - height) / 2,
        width,
        height,
    }
}

fn month_table(
    state: &PickerState,
    field: Field,
    weekdays: WeekdayIndexing,
    theme: &Theme,
) -> Table<'static> {
    let colors = &theme.colors;
    let anchor = state.anchor(field);
    let grid = crate::domain::grid(anchor, state.today, weekdays);
    let focused = state.focus() == field;
    let selected = state.selected(field);

    let header = Row::new(
        WEEKDAY_LABELS
            .iter()
            .map(|label| Cell::from(*label).style(colors.header.to_ratatui())),
    );

    let rows = grid.rows().map(|week| {
        Row::new(week.iter().map(|cell| {
            let Some(day) = cell.day else {
                return Cell::from("");
            };
            let style = if focused && day == state.cursor(field) {
                colors.cursor.to_ratatui_with_modifier(Modifier::BOLD)
            } else if selected.is_some() && selected == anchor.select(day) {
                colors.selected.to_ratatui()
            } else if cell.is_today {
                colors.today.to_ratatui_with_modifier(Modifier::BOLD)
            } else if focused {
                colors.primary.to_ratatui()
            } else {
                colors.dimmed.to_ratatui()
            };
            Cell::from(format!("{day:>3}")).style(style)
        }))
    });

    let border = if focused { &colors.accent } else { &colors.border };
    Table::new(rows, [Constraint::Length(4); 7])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border.to_ratatui())
                .title(format!(" {}: {} ", field.label(), anchor.title()))
                .title_style(colors.month_indicator.to_ratatui())
                .title_alignment(Alignment::Center),
        )
        .column_spacing(0)
}

fn status_line(state: &PickerState, theme: &Theme) -> Paragraph<'static> {
    let colors = &theme.colors;
    let shown = |field: Field| {
        state
            .selected(field)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "--".to_string())
    };

    Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!("{} → {}", shown(Field::Start), shown(Field::End)),
                colors.primary.to_ratatui_with_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![Span::styled(
            "←→↑↓/hjkl=Day • PgUp/PgDn [ ]=Month • Enter=Pick • Tab=Switch • t=Today • r=Reset • q=Cancel",
            Style::default().patch(colors.help_text.to_ratatui()),
        )]),
    ])
    .alignment(Alignment::Center)
}

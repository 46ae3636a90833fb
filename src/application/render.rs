use crate::application::Theme;
use crate::domain::{Board, Bucket, Employee, EmployeeCard, MonthGrid, PtoInterval, WEEKDAY_LABELS};
use std::fmt::Write;

/// Plain-text views of the roster for the command line.
pub struct TextRenderer {
    theme: Theme,
    color: bool,
}

impl TextRenderer {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    pub fn plain() -> Self {
        Self::new(Theme::minimal(), false)
    }

    fn paint(&self, text: &str, pair: &crate::application::ColorPair, bold: bool) -> String {
        match (self.color, bold) {
            (false, _) => text.to_string(),
            (true, false) => pair.colorize(text),
            (true, true) => pair.colorize_bold(text),
        }
    }

    pub fn render_employees(&self, employees: &[Employee]) -> String {
        if employees.is_empty() {
            return "No employees.\n".to_string();
        }

        let mut out = String::new();
        for employee in employees {
            let _ = writeln!(
                out,
                "{:>4}  {:<28} {}  {}",
                employee.id.to_string(),
                employee.full_name(),
                employee.date_of_birth,
                employee.job_description
            );
        }
        out
    }

    pub fn render_board(&self, board: &Board) -> String {
        let colors = &self.theme.colors;
        let mut out = String::new();

        if board.cards.is_empty() {
            out.push_str("No employees.\n");
        }
        for card in &board.cards {
            self.render_card(&mut out, card);
        }

        if !board.orphans.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                self.paint("PTO of deleted employees", &colors.error_text, true)
            );
            for interval in &board.orphans {
                let _ = writeln!(out, "  {}", self.interval_line(interval, true));
            }
        }
        out
    }

    fn render_card(&self, out: &mut String, card: &EmployeeCard) {
        let colors = &self.theme.colors;
        let employee = &card.employee;
        let heading = format!("{} {}", employee.id, employee.full_name());

        let _ = writeln!(
            out,
            "{}  {}",
            self.paint(&heading, &colors.header, true),
            self.paint(&employee.job_description, &colors.secondary, false)
        );
        for bucket in Bucket::ALL {
            let intervals = card.bucket(bucket);
            if intervals.is_empty() {
                continue;
            }
            let title = match bucket {
                Bucket::Current => self.paint(bucket.title(), &colors.accent, true),
                _ => self.paint(bucket.title(), &colors.primary, false),
            };
            let _ = writeln!(out, "  {title}");
            for interval in intervals {
                let line = self.interval_line(interval, false);
                let line = match bucket {
                    Bucket::Past => self.paint(&line, &colors.dimmed, false),
                    _ => line,
                };
                let _ = writeln!(out, "    {line}");
            }
        }
        out.push('\n');
    }

    fn interval_line(&self, interval: &PtoInterval, with_owner: bool) -> String {
        let mut line = format!(
            "{:<5} {} ({})",
            interval.key.to_string(),
            interval.label(),
            interval.season()
        );
        if with_owner {
            let _ = write!(line, " employee {}", interval.employee_id);
        }
        line
    }

    /// Month title, weekday header and six rows; today is marked with `*`.
    pub fn render_month(&self, grid: &MonthGrid) -> String {
        let colors = &self.theme.colors;
        let mut out = String::new();

        let title = self.paint(&grid.anchor.title(), &colors.month_indicator, true);
        let _ = writeln!(out, "{title}");
        let header = WEEKDAY_LABELS
            .iter()
            .map(|label| format!("{label:>4}"))
            .collect::<String>();
        let _ = writeln!(out, "{}", self.paint(&header, &colors.header, false));

        for row in grid.rows() {
            let mut line = String::new();
            for cell in row {
                let text = match (cell.day, cell.is_today) {
                    (Some(day), true) => format!("{day:>3}*"),
                    (Some(day), false) => format!("{day:>3} "),
                    (None, _) => "    ".to_string(),
                };
                if cell.is_today {
                    line.push_str(&self.paint(&text, &colors.today, false));
                } else {
                    line.push_str(&text);
                }
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out
    }
}

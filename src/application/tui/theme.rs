use crossterm::style::{Color as CrosstermColor, Stylize};
use ratatui::style::{Color as RatatuiColor, Modifier, Style as RatatuiStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub primary: ColorPair,
    pub secondary: ColorPair,
    pub accent: ColorPair,

    // Calendar cells
    pub cursor: ColorPair,
    pub selected: ColorPair,
    pub today: ColorPair,
    pub dimmed: ColorPair,

    pub border: ColorPair,
    pub header: ColorPair,
    pub month_indicator: ColorPair,

    pub help_text: ColorPair,
    pub error_text: ColorPair,
}

#[derive(Debug, Clone)]
pub struct ColorPair {
    pub fg: CrosstermColor,
    pub bg: Option<CrosstermColor>,
}

impl ColorPair {
    pub fn new(fg: CrosstermColor) -> Self {
        Self { fg, bg: None }
    }

    pub fn with_bg(fg: CrosstermColor, bg: CrosstermColor) -> Self {
        Self { fg, bg: Some(bg) }
    }

    pub fn to_ratatui(&self) -> RatatuiStyle {
        let mut style = RatatuiStyle::default().fg(RatatuiColor::from(self.fg));
        if let Some(bg) = self.bg {
            style = style.bg(RatatuiColor::from(bg));
        }
        style
    }

    pub fn to_ratatui_with_modifier(&self, modifier: Modifier) -> RatatuiStyle {
        self.to_ratatui().add_modifier(modifier)
    }

    /// ANSI-colored text for plain terminal output.
    pub fn colorize(&self, text: &str) -> String {
        let mut styled = text.with(self.fg);
        if let Some(bg) = self.bg {
            styled = styled.on(bg);
        }
        styled.to_string()
    }

    pub fn colorize_bold(&self, text: &str) -> String {
        let mut styled = text.with(self.fg).bold();
        if let Some(bg) = self.bg {
            styled = styled.on(bg);
        }
        styled.to_string()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            colors: ThemeColors {
                primary: ColorPair::new(CrosstermColor::White),
                secondary: ColorPair::new(CrosstermColor::Grey),
                accent: ColorPair::new(CrosstermColor::Green),

                cursor: ColorPair::with_bg(
                    CrosstermColor::White,
                    CrosstermColor::Rgb { r: 60, g: 60, b: 60 },
                ),
                selected: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Blue),
                today: ColorPair::new(CrosstermColor::Yellow),
                dimmed: ColorPair::new(CrosstermColor::DarkGrey),

                border: ColorPair::new(CrosstermColor::DarkCyan),
                header: ColorPair::new(CrosstermColor::DarkCyan),
                month_indicator: ColorPair::new(CrosstermColor::Green),

                help_text: ColorPair::new(CrosstermColor::DarkCyan),
                error_text: ColorPair::new(CrosstermColor::Red),
            },
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            colors: ThemeColors {
                primary: ColorPair::new(CrosstermColor::Black),
                secondary: ColorPair::new(CrosstermColor::DarkGrey),
                accent: ColorPair::new(CrosstermColor::DarkGreen),

                cursor: ColorPair::with_bg(
                    CrosstermColor::Black,
                    CrosstermColor::Rgb { r: 220, g: 220, b: 220 },
                ),
                selected: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkBlue),
                today: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Yellow),
                dimmed: ColorPair::new(CrosstermColor::Grey),

                border: ColorPair::new(CrosstermColor::DarkBlue),
                header: ColorPair::new(CrosstermColor::DarkBlue),
                month_indicator: ColorPair::new(CrosstermColor::DarkGreen),

                help_text: ColorPair::new(CrosstermColor::DarkBlue),
                error_text: ColorPair::new(CrosstermColor::DarkRed),
            },
        }
    }

    pub fn minimal() -> Self {
        let plain = ColorPair::new(CrosstermColor::White);
        Self {
            name: "Minimal".to_string(),
            colors: ThemeColors {
                primary: plain.clone(),
                secondary: ColorPair::new(CrosstermColor::Grey),
                accent: plain.clone(),

                cursor: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::White),
                selected: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Grey),
                today: plain.clone(),
                dimmed: ColorPair::new(CrosstermColor::DarkGrey),

                border: plain.clone(),
                header: plain.clone(),
                month_indicator: plain.clone(),

                help_text: ColorPair::new(CrosstermColor::Grey),
                error_text: plain,
            },
        }
    }

    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            "minimal" => Self::minimal(),
            _ => Self::dark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        assert_eq!(Theme::by_name("LIGHT").name, "Light");
        assert_eq!(Theme::by_name("solarized").name, "Dark");
    }

    #[test]
    fn style_carries_background() {
        let pair = ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::DarkBlue);
        let style = pair.to_ratatui();
        assert_eq!(style.fg, Some(RatatuiColor::Black));
        assert_eq!(style.bg, Some(RatatuiColor::Blue));
    }
}

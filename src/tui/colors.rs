//! Colors for the terminal user interface, derived from the configured palette.

use std::str::FromStr;

use ratatui::style::Color;

use project_dashboard::config::Palette;
use project_dashboard::fields::TaskStatus;

/// Used when a configured color is not something the terminal understands.
pub const FALLBACK: Color = Color::Gray;

/// Parse `#RRGGBB` or a named color.
pub fn parse_color(value: &str) -> Color {
    Color::from_str(value.trim()).unwrap_or(FALLBACK)
}

/// Palette resolved to terminal colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub accent: Color,
    pub completed: Color,
    pub in_progress: Color,
    pub overdue: Color,
    pub not_started: Color,
}

impl Theme {
    pub fn from_palette(palette: &Palette) -> Self {
        Theme {
            accent: parse_color(&palette.accent_color),
            completed: parse_color(&palette.completed_color),
            in_progress: parse_color(&palette.in_progress_color),
            overdue: parse_color(&palette.overdue_color),
            not_started: parse_color(&palette.not_started_color),
        }
    }

    /// Late completions share the overdue color.
    pub fn status(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::NotStarted => self.not_started,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Overdue | TaskStatus::OverdueCompleted => self.overdue,
            TaskStatus::Completed => self.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#3370FF"), Color::Rgb(0x33, 0x70, 0xFF));
        assert_eq!(parse_color(" red "), Color::Red);
        assert_eq!(parse_color("not a color"), FALLBACK);
    }

    #[test]
    fn test_theme_from_default_palette() {
        let theme = Theme::from_palette(&Palette::default());
        assert_eq!(theme.accent, Color::Rgb(0x33, 0x70, 0xFF));
        assert_eq!(theme.status(TaskStatus::Completed), Color::Rgb(0x34, 0xC7, 0x24));
        assert_eq!(theme.status(TaskStatus::OverdueCompleted), theme.overdue);
        assert_eq!(theme.status(TaskStatus::NotStarted), Color::Rgb(0x8F, 0x95, 0x9E));
    }
}

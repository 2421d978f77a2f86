//! Theme configuration for the dashboard.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Freshness;

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for sensors with a recent reading.
    pub fresh: Color,
    /// Color for sensors with old data or a failed refresh.
    pub stale: Color,
    /// Color for sensors without any data.
    pub missing: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color of the trend chart.
    pub trend: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            fresh: Color::Green,
            stale: Color::Yellow,
            missing: Color::Red,
            border: Color::Gray,
            trend: Color::Cyan,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            fresh: Color::Green,
            stale: Color::Yellow,
            missing: Color::Red,
            border: Color::DarkGray,
            trend: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a freshness class
    pub fn freshness_style(&self, freshness: Freshness) -> Style {
        match freshness {
            Freshness::Fresh => Style::default().fg(self.fresh),
            Freshness::Stale => Style::default().fg(self.stale),
            Freshness::Missing => Style::default().fg(self.missing).add_modifier(Modifier::BOLD),
        }
    }
}

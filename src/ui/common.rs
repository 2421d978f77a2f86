//! Common UI components: header bar, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Freshness;
use crate::ui::summary::format_age;

/// Render the header bar.
///
/// Displays: overall status, sensor counts by freshness, and when the
/// headline sensor last reported.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref snapshot) = app.snapshot else {
        let line = Line::from(vec![
            Span::styled(" FEEDWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let (fresh, stale, missing) = snapshot.freshness_counts(app.stale_after_minutes);

    let overall = if missing > 0 {
        Freshness::Missing
    } else if stale > 0 || snapshot.error.is_some() {
        Freshness::Stale
    } else {
        Freshness::Fresh
    };

    let count = |n: usize, freshness: Freshness| {
        if n > 0 {
            Span::styled(n.to_string(), app.theme.freshness_style(freshness))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let readings_at = match snapshot.headline() {
        Some(reading) => format!(
            "Readings at {} ({} ago)",
            reading.timestamp,
            format_age(reading.age_minutes(snapshot.taken_at))
        ),
        None => "No readings".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.freshness_style(overall)),
        Span::styled("FEEDWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        count(fresh, Freshness::Fresh),
        Span::raw(" ok "),
        count(stale, Freshness::Stale),
        Span::raw(" stale "),
        count(missing, Freshness::Missing),
        Span::raw(" none │ "),
        Span::raw(readings_at),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows the source, time since the last snapshot and the controls. Also
/// displays temporary status messages and refresh errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = match (&app.load_error, app.last_updated) {
        (Some(err), _) => format!(" Error: {} | r:retry q:quit", err),
        (None, Some(updated)) => format!(
            " {} | Updated {:.0}s ago | s:sort r:refresh e:export ?:help q:quit",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
        ),
        (None, None) => format!(" {} | Loading... | q:quit", app.source_description()),
    };

    let style = if app.load_error.is_some() {
        app.theme.freshness_style(Freshness::Stale)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the table.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(" Navigation", bold)]),
        Line::from("  ↑/↓ j/k     Select sensor"),
        Line::from("  PgUp/PgDn   Jump 10 sensors"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        Line::from(vec![Span::styled(" Table", bold)]),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

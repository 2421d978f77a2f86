//! Sensor table and trend chart.
//!
//! Displays one row per sensor with its last value, window min/max, age and
//! freshness, plus a trend chart of the selected sensor's window.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Row, Sparkline, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::SensorSnapshot;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Width of the in-table trend column.
const TREND_WIDTH: usize = 8;

/// Column to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Configured sensor order.
    #[default]
    Order,
    /// Sort by sensor name alphabetically.
    Name,
    /// Sort by last value.
    Value,
    /// Sort by minutes since the last reading.
    Age,
    /// Sort by freshness.
    Status,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Order => SortColumn::Name,
            SortColumn::Name => SortColumn::Value,
            SortColumn::Value => SortColumn::Age,
            SortColumn::Age => SortColumn::Status,
            SortColumn::Status => SortColumn::Order,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Order => "order",
            SortColumn::Name => "name",
            SortColumn::Value => "value",
            SortColumn::Age => "age",
            SortColumn::Status => "status",
        }
    }
}

/// Render the sensor table and, below it, the selected sensor's trend.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref snapshot) = app.snapshot else {
        return;
    };
    let now = snapshot.taken_at;
    let sensors = app.sorted_sensors();

    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(7)]).split(area);

    let header = Row::new(vec![
        Cell::from(format_header("Sensor", SortColumn::Name, app)),
        Cell::from(format_header("Last", SortColumn::Value, app)),
        Cell::from("Min"),
        Cell::from("Max"),
        Cell::from("Readings"),
        Cell::from(format_header("Age", SortColumn::Age, app)),
        Cell::from("Trend"),
        Cell::from(format_header("Status", SortColumn::Status, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = sensors
        .iter()
        .map(|s| {
            let freshness = s.freshness(now, app.stale_after_minutes);
            let status_style = app.theme.freshness_style(freshness);
            let value = |v: Option<f64>| v.map(|v| s.format_value(v)).unwrap_or_else(|| "-".into());

            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(value(s.last.map(|r| r.value))),
                Cell::from(value(s.min)),
                Cell::from(value(s.max)),
                Cell::from(s.count.to_string()),
                Cell::from(s.age_minutes(now).map(format_age).unwrap_or_else(|| "-".into()))
                    .style(status_style),
                Cell::from(render_sparkline(&s.trend)),
                Cell::from(freshness.symbol()).style(status_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3), // Sensor
        Constraint::Fill(2), // Last
        Constraint::Fill(2), // Min
        Constraint::Fill(2), // Max
        Constraint::Fill(1), // Readings
        Constraint::Fill(1), // Age
        Constraint::Min(TREND_WIDTH as u16),
        Constraint::Min(6), // Status
    ];

    let selected = app.selected_index.min(sensors.len().saturating_sub(1));
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };
    let position_info = if sensors.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, sensors.len())
    };
    let title = format!(
        " Sensors ({}) [s:sort {}{}]{} ",
        sensors.len(),
        app.sort_column.label(),
        sort_dir,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, chunks[0], &mut state);

    if let Some(sensor) = sensors.get(selected) {
        render_trend(frame, app, sensor, chunks[1]);
    }
}

fn render_trend(frame: &mut Frame, app: &App, sensor: &SensorSnapshot, area: Rect) {
    let range = match (sensor.min, sensor.max) {
        (Some(min), Some(max)) => format!(
            " {} to {} ",
            sensor.format_value(min),
            sensor.format_value(max)
        ),
        _ => " no data ".to_string(),
    };
    let title = format!(
        " {} - last {}h{}",
        sensor.name, sensor.window_hours, range
    );

    let data = scale_trend(&sensor.trend, area.width.saturating_sub(2) as usize);
    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .data(&data)
        .style(Style::default().fg(app.theme.trend));

    frame.render_widget(sparkline, area);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort sensors by the given column and direction.
///
/// Missing values sort last in ascending order. Ties keep the configured
/// order.
pub fn sort_sensors_by(
    sensors: &mut [&SensorSnapshot],
    column: SortColumn,
    ascending: bool,
    now: NaiveDateTime,
    stale_after_minutes: i64,
) {
    sensors.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Order => Ordering::Equal,
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Value => cmp_missing_last(
                a.last.map(|r| r.value),
                b.last.map(|r| r.value),
                |x, y| x.total_cmp(y),
            ),
            SortColumn::Age => cmp_missing_last(a.age_minutes(now), b.age_minutes(now), Ord::cmp),
            SortColumn::Status => a
                .freshness(now, stale_after_minutes)
                .cmp(&b.freshness(now, stale_after_minutes)),
        };
        if ascending {
            primary
        } else {
            primary.reverse()
        }
    });
    if column == SortColumn::Order && !ascending {
        sensors.reverse();
    }
}

fn cmp_missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compact age, e.g. "5m", "3h12m", "2d".
pub fn format_age(minutes: i64) -> String {
    if minutes < 0 {
        return format!("{}m", minutes);
    }
    match (minutes / (24 * 60), (minutes / 60) % 24, minutes % 60) {
        (0, 0, m) => format!("{}m", m),
        (0, h, m) => format!("{}h{:02}m", h, m),
        (d, _, _) => format!("{}d", d),
    }
}

/// Text sparkline of the newest `TREND_WIDTH` values.
fn render_sparkline(values: &[f64]) -> String {
    if values.is_empty() {
        return " ".repeat(TREND_WIDTH);
    }
    let tail = &values[values.len().saturating_sub(TREND_WIDTH)..];
    let (min, max) = bounds(tail);
    tail.iter()
        .map(|&v| SPARKLINE_CHARS[level(v, min, max, SPARKLINE_CHARS.len() as f64 - 1.0) as usize])
        .collect()
}

/// Scale the newest `width` values to 1..=100 for the chart widget.
pub fn scale_trend(values: &[f64], width: usize) -> Vec<u64> {
    let tail = &values[values.len().saturating_sub(width)..];
    let (min, max) = bounds(tail);
    tail.iter().map(|&v| 1 + level(v, min, max, 99.0)).collect()
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn level(value: f64, min: f64, max: f64, top: f64) -> u64 {
    if max > min {
        (((value - min) / (max - min)) * top).round() as u64
    } else {
        (top / 2.0).round() as u64
    }
}

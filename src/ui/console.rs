//! Plain-text tables for the one-shot `stats` and `summary` commands.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use feedwatch_types::{minutes_since, Reading};

use crate::data::{Latest, SuiteSnapshot};

/// One row of the `stats` table.
#[derive(Debug, Tabled)]
pub struct LatestRow {
    pub measure: String,
    pub value: String,
}

/// One row of the `summary` table.
#[derive(Debug, Tabled)]
pub struct SummaryRow {
    pub measure: String,
    pub value: String,
    #[tabled(rename = "min-value")]
    pub min_value: String,
    #[tabled(rename = "max-value")]
    pub max_value: String,
}

fn render<R: Tabled>(rows: Vec<R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

fn format_value(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) if !unit.is_empty() => format!("{:.1} {}", value, unit),
        _ => format!("{:.1}", value),
    }
}

fn readings_at(headline: Option<&Reading>, now: NaiveDateTime) -> String {
    match headline {
        Some(reading) => format!(
            "Readings at {}\nMinutes since last reading: {} minutes\n",
            reading.timestamp,
            minutes_since(reading.timestamp, now)
        ),
        None => "No readings available\n".to_string(),
    }
}

/// Latest value of every sensor.
pub fn stats_report(latest: &[Latest], now: NaiveDateTime) -> String {
    let headline = latest.first().and_then(|l| l.reading.as_ref().ok());
    let mut out = readings_at(headline, now);
    out.push('\n');

    let rows: Vec<LatestRow> = latest
        .iter()
        .map(|l| LatestRow {
            measure: l.name.clone(),
            value: match &l.reading {
                Ok(reading) => format_value(reading.value, l.unit.as_deref()),
                Err(_) => "error".to_string(),
            },
        })
        .collect();
    out.push_str(&render(rows));

    for l in latest {
        if let Err(err) = &l.reading {
            let _ = writeln!(out, "{}: {}", l.name, err);
        }
    }
    out
}

/// Last value with window min/max of every sensor.
pub fn summary_report(snapshot: &SuiteSnapshot) -> String {
    let mut out = readings_at(snapshot.headline(), snapshot.taken_at);
    out.push('\n');

    let cell = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into());
    let rows: Vec<SummaryRow> = snapshot
        .sensors
        .iter()
        .map(|s| SummaryRow {
            measure: s.name.clone(),
            value: cell(s.last.map(|r| r.value)),
            min_value: cell(s.min),
            max_value: cell(s.max),
        })
        .collect();
    out.push_str(&render(rows));

    for s in snapshot.failures() {
        if let Some(err) = &s.error {
            let _ = writeln!(out, "{}: {}", s.name, err);
        }
    }
    out
}

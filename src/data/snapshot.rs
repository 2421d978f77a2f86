//! Point-in-time copies of a suite's derived values.
//!
//! Snapshots decouple presentation from the live [`SensorSuite`]: the
//! dashboard, the console tables and JSON export all read snapshots, while
//! the suite itself stays owned by whoever refreshes it.
//!
//! [`SensorSuite`]: super::SensorSuite

use chrono::NaiveDateTime;
use serde::Serialize;

use feedwatch_types::{minutes_since, Reading};

/// How current a sensor's data is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Last reading is within the staleness threshold.
    Fresh,
    /// Last reading is older than the threshold, or the latest refresh
    /// failed and older data is shown.
    Stale,
    /// No readings at all.
    Missing,
}

impl Freshness {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Freshness::Fresh => "OK",
            Freshness::Stale => "STALE",
            Freshness::Missing => "NONE",
        }
    }
}

/// Derived values of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub name: String,
    pub feed_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub window_hours: u32,
    /// Number of readings in the window.
    pub count: usize,
    pub last: Option<Reading>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
    /// Window values, oldest first.
    #[serde(skip)]
    pub trend: Vec<f64>,
    /// Error from the most recent refresh attempt, if it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SensorSnapshot {
    /// Minutes since the last reading, relative to a local `now`.
    pub fn age_minutes(&self, now: NaiveDateTime) -> Option<i64> {
        self.last.map(|r| minutes_since(r.timestamp, now))
    }

    /// Classify the data against a staleness threshold in minutes.
    pub fn freshness(&self, now: NaiveDateTime, stale_after_minutes: i64) -> Freshness {
        match self.age_minutes(now) {
            None => Freshness::Missing,
            Some(_) if self.error.is_some() => Freshness::Stale,
            Some(age) if age > stale_after_minutes => Freshness::Stale,
            Some(_) => Freshness::Fresh,
        }
    }

    /// Format a value with this sensor's unit.
    pub fn format_value(&self, value: f64) -> String {
        match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => format!("{:.1} {}", value, unit),
            _ => format!("{:.1}", value),
        }
    }
}

/// Derived values of every sensor in a suite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteSnapshot {
    /// Local time the snapshot was taken.
    pub taken_at: NaiveDateTime,
    /// One entry per sensor, in suite order.
    pub sensors: Vec<SensorSnapshot>,
    /// Set when the refresh that produced this snapshot was aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuiteSnapshot {
    /// The reading shown as "Readings at": the first sensor's last reading.
    pub fn headline(&self) -> Option<&Reading> {
        self.sensors.first().and_then(|s| s.last.as_ref())
    }

    /// Count sensors per freshness class (fresh, stale, missing).
    pub fn freshness_counts(&self, stale_after_minutes: i64) -> (usize, usize, usize) {
        self.sensors.iter().fold((0, 0, 0), |(f, s, m), sensor| {
            match sensor.freshness(self.taken_at, stale_after_minutes) {
                Freshness::Fresh => (f + 1, s, m),
                Freshness::Stale => (f, s + 1, m),
                Freshness::Missing => (f, s, m + 1),
            }
        })
    }

    /// Sensors whose latest refresh failed.
    pub fn failures(&self) -> impl Iterator<Item = &SensorSnapshot> {
        self.sensors.iter().filter(|s| s.error.is_some())
    }
}

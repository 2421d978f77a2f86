//! A named sensor and the window of readings last fetched for it.

use chrono::NaiveDateTime;
use thiserror::Error;

use feedwatch_adapters::{FeedClient, FeedError};
use feedwatch_types::Reading;

use super::snapshot::SensorSnapshot;

/// Hours of history fetched on each refresh unless configured otherwise.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Errors from derived statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// A statistic was requested before any readings were fetched, or the
    /// last fetch returned an empty window.
    #[error("sensor '{sensor}' has no readings")]
    EmptyData { sensor: String },
}

/// A sensor published as one feed.
///
/// The sensor starts without data. Each successful [`refresh`](Self::refresh)
/// replaces the whole set of readings with the fetched window; a failed
/// refresh leaves the previous readings untouched. Readings keep the order
/// the service returned them in, newest first, so [`last`](Self::last) is
/// simply the first entry.
#[derive(Debug, Clone)]
pub struct Sensor {
    name: String,
    feed_id: String,
    unit: Option<String>,
    window_hours: u32,
    readings: Vec<Reading>,
}

impl Sensor {
    /// Create a sensor with no readings and the default window.
    pub fn new(name: impl Into<String>, feed_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_id: feed_id.into(),
            unit: None,
            window_hours: DEFAULT_WINDOW_HOURS,
            readings: Vec::new(),
        }
    }

    /// Set how many hours of history each refresh fetches.
    pub fn with_window_hours(mut self, hours: u32) -> Self {
        self.window_hours = hours;
        self
    }

    /// Set the display unit (e.g. "C", "%").
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Display name. Not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feed_id(&self) -> &str {
        &self.feed_id
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn window_hours(&self) -> u32 {
        self.window_hours
    }

    /// Readings from the last successful refresh, newest first.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Fetch the sensor's window and replace the stored readings with it.
    pub async fn refresh<C>(&mut self, client: &C) -> Result<&[Reading], FeedError>
    where
        C: FeedClient + ?Sized,
    {
        let readings = client
            .fetch_window(&self.feed_id, self.window_hours)
            .await?;
        tracing::debug!(
            sensor = %self.name,
            feed = %self.feed_id,
            readings = readings.len(),
            "sensor refreshed"
        );
        self.readings = readings;
        Ok(&self.readings)
    }

    /// Smallest value in the window.
    pub fn min(&self) -> Result<f64, SensorError> {
        self.values().reduce(f64::min).ok_or_else(|| self.empty())
    }

    /// Largest value in the window.
    pub fn max(&self) -> Result<f64, SensorError> {
        self.values().reduce(f64::max).ok_or_else(|| self.empty())
    }

    /// Earliest timestamp in the window.
    pub fn min_timestamp(&self) -> Result<NaiveDateTime, SensorError> {
        self.timestamps().min().ok_or_else(|| self.empty())
    }

    /// Latest timestamp in the window.
    pub fn max_timestamp(&self) -> Result<NaiveDateTime, SensorError> {
        self.timestamps().max().ok_or_else(|| self.empty())
    }

    /// The first reading the service returned (assumed newest).
    pub fn last(&self) -> Result<&Reading, SensorError> {
        self.readings.first().ok_or_else(|| self.empty())
    }

    /// Copy the derived values out for display or export.
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            name: self.name.clone(),
            feed_id: self.feed_id.clone(),
            unit: self.unit.clone(),
            window_hours: self.window_hours,
            count: self.readings.len(),
            last: self.last().ok().copied(),
            min: self.min().ok(),
            max: self.max().ok(),
            min_timestamp: self.min_timestamp().ok(),
            max_timestamp: self.max_timestamp().ok(),
            trend: self.readings.iter().rev().map(|r| r.value).collect(),
            error: None,
        }
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().map(|r| r.value)
    }

    fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.readings.iter().map(|r| r.timestamp)
    }

    fn empty(&self) -> SensorError {
        SensorError::EmptyData {
            sensor: self.name.clone(),
        }
    }
}

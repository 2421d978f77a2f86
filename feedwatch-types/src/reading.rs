//! Reading - one observation from a feed.

use chrono::NaiveDateTime;

use crate::{minutes_since, parse_feed_timestamp, to_local, TimestampError};

/// A single `(timestamp, value)` observation.
///
/// The timestamp is local wall-clock time (see [`to_local`]). Readings are
/// plain values; a sensor replaces its whole set of readings on refresh
/// rather than editing individual entries.
///
/// # Example
///
/// ```rust
/// use feedwatch_types::Reading;
///
/// let reading = Reading::from_feed("2024-01-01T11:00:00Z", 20.0).unwrap();
/// assert_eq!(reading.value, 20.0);
/// assert_eq!(reading.timestamp.to_string(), "2024-01-01 03:00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Local wall-clock time of the observation.
    pub timestamp: NaiveDateTime,
    /// Observed value.
    pub value: f64,
}

impl Reading {
    /// Create a reading from an already-local timestamp.
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Create a reading from a feed's UTC `created_at` string.
    pub fn from_feed(created_at: &str, value: f64) -> Result<Self, TimestampError> {
        let instant = parse_feed_timestamp(created_at)?;
        Ok(Self::new(to_local(instant), value))
    }

    /// Whole minutes between this reading and a local `now`.
    pub fn age_minutes(&self, now: NaiveDateTime) -> i64 {
        minutes_since(self.timestamp, now)
    }
}

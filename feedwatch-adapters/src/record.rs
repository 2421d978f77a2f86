//! Raw data points as the feed service returns them.

use std::fmt;

use serde::{Deserialize, Serialize};

use feedwatch_types::Reading;

use crate::FeedError;

/// One data point in the service's JSON shape.
///
/// Only `created_at` and `value` are read; the service sends more fields
/// (ids, location, expiry) which are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    /// UTC timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
    pub created_at: String,
    /// The value, which the service usually sends as a string.
    pub value: RawValue,
}

/// A data point value: JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Interpret the value as a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl FeedRecord {
    /// Create a record from its raw parts.
    pub fn new(created_at: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            created_at: created_at.into(),
            value: RawValue::Text(value.into()),
        }
    }

    /// Normalize the record into a [`Reading`].
    pub fn into_reading(self) -> Result<Reading, FeedError> {
        let value = self.value.as_f64().ok_or_else(|| {
            FeedError::Format(format!("value {} is not a finite number", self.value))
        })?;
        Reading::from_feed(&self.created_at, value).map_err(|e| FeedError::Format(e.to_string()))
    }
}

/// Normalize a page of records, keeping the order they arrived in.
pub fn into_readings(records: Vec<FeedRecord>) -> Result<Vec<Reading>, FeedError> {
    records.into_iter().map(FeedRecord::into_reading).collect()
}

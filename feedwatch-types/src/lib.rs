//! # feedwatch-types
//!
//! Core types shared by the feedwatch crates: the [`Reading`] value and the
//! functions that turn feed timestamps into local wall-clock time.
//!
//! ## Time model
//!
//! Feeds report instants in UTC using a fixed `YYYY-MM-DDTHH:MM:SSZ` layout.
//! Readings carry a local timestamp that is the UTC instant minus a constant
//! [`LOCAL_OFFSET_HOURS`]. The shift is plain arithmetic: no time zone
//! database, no daylight saving.
//!
//! ## Features
//!
//! - `serde`: Serialize/Deserialize for [`Reading`]
//!
//! ## Example
//!
//! ```rust
//! use feedwatch_types::{minutes_since, Reading};
//!
//! let reading = Reading::from_feed("2024-01-01T12:00:00Z", 21.5).unwrap();
//! assert_eq!(reading.timestamp.to_string(), "2024-01-01 04:00:00");
//!
//! let later = Reading::from_feed("2024-01-01T12:01:05Z", 21.7).unwrap();
//! assert_eq!(minutes_since(reading.timestamp, later.timestamp), 1);
//! ```

mod reading;
mod time;

pub use reading::*;
pub use time::*;

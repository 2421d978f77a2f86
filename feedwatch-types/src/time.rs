//! Feed timestamp parsing and local time conversion.
//!
//! Local time is a fixed offset from UTC. Timestamps are shifted by
//! [`LOCAL_OFFSET_HOURS`] and carried as naive wall-clock values, so two
//! local timestamps can be compared and subtracted directly.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Layout of every timestamp the feed service emits or accepts.
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Hours subtracted from UTC to get local wall-clock time.
pub const LOCAL_OFFSET_HOURS: i64 = 8;

/// A feed timestamp that does not match [`FEED_TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid feed timestamp {input:?}: expected YYYY-MM-DDTHH:MM:SSZ")]
pub struct TimestampError {
    input: String,
}

impl TimestampError {
    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Parse a feed timestamp such as `2024-01-01T12:00:00Z` as a UTC instant.
///
/// Only the exact feed layout is accepted. Fractional seconds, numeric
/// offsets and surrounding text are rejected.
pub fn parse_feed_timestamp(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    NaiveDateTime::parse_from_str(s, FEED_TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| TimestampError {
            input: s.to_string(),
        })
}

/// Format a UTC instant in the feed layout (used for query parameters).
pub fn format_feed_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(FEED_TIMESTAMP_FORMAT).to_string()
}

/// Convert a UTC instant to local wall-clock time.
pub fn to_local(instant: DateTime<Utc>) -> NaiveDateTime {
    (instant - Duration::hours(LOCAL_OFFSET_HOURS)).naive_utc()
}

/// The current local wall-clock time.
pub fn local_now() -> NaiveDateTime {
    to_local(Utc::now())
}

/// Largest window, in hours, that settings and queries accept (ten years).
pub const MAX_WINDOW_HOURS: u32 = 24 * 365 * 10;

/// Start of a window reaching `hours` back from `now`.
///
/// `None` when the start falls outside the representable range.
pub fn window_start(now: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    Duration::try_hours(i64::from(hours)).and_then(|span| now.checked_sub_signed(span))
}

/// Whole minutes elapsed from `instant` to `now`.
///
/// Rounds toward negative infinity, so 65 seconds is 1 minute and -30
/// seconds is -1 minute. Instants after `now` give negative results.
pub fn minutes_since(instant: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - instant).num_seconds().div_euclid(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_feed_layout() {
        let instant = parse_feed_timestamp("2024-01-01T12:00:00Z").unwrap();
        assert_eq!(instant.year(), 2024);
        assert_eq!(instant.hour(), 12);
        assert_eq!(instant.timestamp(), 1_704_110_400);
    }

    #[test]
    fn rejects_other_layouts() {
        for input in [
            "",
            "2024-01-01",
            "2024-01-01 12:00:00",
            "2024-01-01T12:00:00",
            "2024-01-01T12:00:00+00:00",
            "2024-01-01T12:00:00.500Z",
            "2024-01-01T12:00:00Zjunk",
            "2024-13-01T12:00:00Z",
        ] {
            let err = parse_feed_timestamp(input).unwrap_err();
            assert_eq!(err.input(), input);
        }
    }

    #[test]
    fn error_message_names_input() {
        let err = parse_feed_timestamp("yesterday").unwrap_err();
        assert!(err.to_string().contains("\"yesterday\""));
    }

    #[test]
    fn to_local_subtracts_fixed_offset() {
        let instant = parse_feed_timestamp("2024-01-01T12:00:00Z").unwrap();
        assert_eq!(to_local(instant), local(2024, 1, 1, 4, 0, 0));
    }

    #[test]
    fn to_local_crosses_midnight() {
        let instant = parse_feed_timestamp("2024-03-01T03:30:00Z").unwrap();
        assert_eq!(to_local(instant), local(2024, 2, 29, 19, 30, 0));
    }

    #[test]
    fn to_local_ignores_daylight_saving() {
        // Mid-summer and mid-winter shift by the same amount.
        for input in ["2024-07-01T12:00:00Z", "2024-12-01T12:00:00Z"] {
            let instant = parse_feed_timestamp(input).unwrap();
            let shifted = to_local(instant);
            assert_eq!(
                instant.naive_utc() - shifted,
                Duration::hours(LOCAL_OFFSET_HOURS)
            );
        }
    }

    #[test]
    fn format_round_trips_layout() {
        let input = "2023-06-15T08:09:10Z";
        let instant = parse_feed_timestamp(input).unwrap();
        assert_eq!(format_feed_timestamp(instant), input);
    }

    #[test]
    fn window_start_reaches_back() {
        let now = parse_feed_timestamp("2024-01-02T00:00:00Z").unwrap();
        let start = window_start(now, 24).unwrap();
        assert_eq!(format_feed_timestamp(start), "2024-01-01T00:00:00Z");

        let start = window_start(now, MAX_WINDOW_HOURS).unwrap();
        assert_eq!(start.year(), 2014);
    }

    #[test]
    fn window_start_out_of_range_is_none() {
        assert_eq!(window_start(Utc::now(), u32::MAX), None);
    }

    #[test]
    fn minutes_since_same_instant_is_zero() {
        let t = local(2024, 1, 1, 4, 0, 0);
        assert_eq!(minutes_since(t, t), 0);
    }

    #[test]
    fn minutes_since_truncates() {
        let t = local(2024, 1, 1, 4, 0, 0);
        assert_eq!(minutes_since(t, t + Duration::seconds(65)), 1);
        assert_eq!(minutes_since(t, t + Duration::seconds(119)), 1);
        assert_eq!(minutes_since(t, t + Duration::seconds(120)), 2);
    }

    #[test]
    fn minutes_since_spans_days() {
        let t = local(2024, 1, 1, 4, 0, 0);
        let now = t + Duration::days(2) + Duration::minutes(3) + Duration::seconds(59);
        assert_eq!(minutes_since(t, now), 2 * 24 * 60 + 3);
    }

    #[test]
    fn minutes_since_future_is_negative() {
        let t = local(2024, 1, 1, 4, 0, 0);
        assert_eq!(minutes_since(t, t - Duration::seconds(30)), -1);
        assert_eq!(minutes_since(t, t - Duration::seconds(60)), -1);
        assert_eq!(minutes_since(t, t - Duration::seconds(61)), -2);
    }
}

//! Canned data for `--demo` runs.
//!
//! Every configured sensor gets a smooth synthetic series, one reading every
//! 15 minutes across its window, ending a few minutes before `now`.

use std::time::Duration;

use chrono::{DateTime, Utc};

use feedwatch_adapters::client::MAX_RECORDS;
use feedwatch_adapters::StaticFeed;

use crate::config::{SensorConfig, Settings};

/// Spacing of the generated readings.
const STEP_MINUTES: i64 = 15;

/// Simulated per-request latency.
pub const DEMO_LATENCY: Duration = Duration::from_millis(150);

/// A static feed serving demo data for the configured sensors.
pub fn demo_feed(settings: &Settings) -> StaticFeed {
    demo_feed_at(&settings.sensors, settings.window_hours, Utc::now()).with_latency(DEMO_LATENCY)
}

pub fn demo_feed_at(
    sensors: &[SensorConfig],
    default_window_hours: u32,
    now: DateTime<Utc>,
) -> StaticFeed {
    let newest = now - chrono::Duration::minutes(3);
    sensors.iter().fold(StaticFeed::new(), |feed, sensor| {
        let hours = sensor.window_hours.unwrap_or(default_window_hours);
        let count = (i64::from(hours) * 60 / STEP_MINUTES).clamp(1, i64::from(MAX_RECORDS)) as usize;
        let (base, swing) = profile(&sensor.name);
        feed.with_generated(
            sensor.feed.clone(),
            newest,
            count,
            chrono::Duration::minutes(STEP_MINUTES),
            move |i| base + swing * (i as f64 / 16.0).sin(),
        )
    })
}

/// Base value and amplitude of a sensor's series.
fn profile(name: &str) -> (f64, f64) {
    match name {
        "temperature" => (21.0, 2.5),
        "humidity" => (45.0, 8.0),
        "pm10" => (4.0, 3.0),
        "pm25" => (7.0, 5.0),
        "pm100" => (9.0, 6.0),
        _ => (10.0, 2.0),
    }
}

//! # feedwatch
//!
//! A console dashboard for environmental sensors published as Adafruit IO
//! feeds.
//!
//! Each [`Sensor`] is bound to one feed. A [`SensorSuite`] refreshes all of
//! its sensors through one shared [`FeedClient`], either one after the other
//! or as a concurrent fan-out, and derives the last, minimum and maximum
//! value of each sensor's recent window.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │ (suite)  │    │(render) │    │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐      ┌─────────┐                                │
//! │  │ source  │◀─────│ poller  │◀── FeedClient (Adafruit IO,    │
//! │  │ (input) │      │ (task)  │               static feed)     │
//! │  └─────────┘      └─────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: layered settings (file, environment) and suite construction
//! - **[`data`]**: [`Sensor`], [`SensorSuite`] and their snapshots
//! - **[`source`]**: the [`DataSource`] trait and the background refresh task
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the live dashboard and console tables
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! export ADAFRUIT_IO_USERNAME=me ADAFRUIT_IO_KEY=aio_...
//!
//! feedwatch stats              # latest value of every sensor
//! feedwatch summary --hours 6  # last/min/max over the last 6 hours
//! feedwatch watch              # live dashboard
//! feedwatch --demo watch       # dashboard on synthetic data
//! ```
//!
//! ### As a library
//!
//! ```
//! use feedwatch::{FailurePolicy, Schedule, Sensor, SensorSuite};
//! use feedwatch_adapters::{FeedRecord, StaticFeed};
//!
//! # tokio_test::block_on(async {
//! let feed = StaticFeed::new().with_feed(
//!     "office-temperature.office-temperature",
//!     [
//!         FeedRecord::new("2024-01-01T12:00:00Z", "21.5"),
//!         FeedRecord::new("2024-01-01T11:00:00Z", "20.0"),
//!     ],
//! );
//!
//! let mut suite = SensorSuite::new(vec![Sensor::new(
//!     "temperature",
//!     "office-temperature.office-temperature",
//! )])
//! .with_schedule(Schedule::Concurrent)
//! .with_policy(FailurePolicy::Abort);
//!
//! suite.refresh_all(&feed).await.unwrap();
//! let temperature = &suite.sensors()[0];
//! assert_eq!(temperature.max().unwrap(), 21.5);
//! assert_eq!(temperature.last().unwrap().timestamp.to_string(), "2024-01-01 04:00:00");
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod demo;
pub mod events;
pub mod source;
pub mod ui;

pub use app::App;
pub use config::{ConfigError, SensorConfig, Settings};
pub use data::{
    FailurePolicy, Freshness, RefreshError, RefreshReport, Schedule, Sensor, SensorError,
    SensorSnapshot, SensorSuite, SuiteSnapshot,
};
pub use source::{spawn_poller, ChannelSource, DataSource};

pub use feedwatch_adapters::{FeedClient, FeedError};
pub use feedwatch_types::Reading;

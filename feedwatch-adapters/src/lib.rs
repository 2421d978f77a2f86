//! # feedwatch-adapters
//!
//! Clients for fetching sensor readings from IoT data-feed services.
//!
//! Every client implements [`FeedClient`], which offers two bounded reads:
//! the most recent data point of a feed, and every data point inside a
//! trailing window of hours. Timestamps are normalized to local time before
//! they leave the client.
//!
//! ## Clients
//!
//! - **Adafruit IO** (`adafruit` feature, default) - the REST API v2, with a
//!   static `X-AIO-Key` header
//! - **Static feed** - canned, in-memory records with optional latency, for
//!   tests, benchmarks and demos
//!
//! ## Quick Start (Adafruit IO)
//!
//! ```rust,no_run
//! use feedwatch_adapters::adafruit::AdafruitIoClient;
//! use feedwatch_adapters::FeedClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdafruitIoClient::builder()
//!         .credentials("my-user", "aio_key")
//!         .build()?;
//!
//!     let last = client.fetch_last("air-quality-pm25").await?;
//!     println!("pm25 = {} at {}", last.value, last.timestamp);
//!
//!     let window = client.fetch_window("air-quality-pm25", 24).await?;
//!     println!("{} readings in the last 24h", window.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod record;

#[cfg(feature = "adafruit")]
pub mod adafruit;

pub use client::FeedClient;
pub use error::FeedError;
pub use memory::{FeedRequest, StaticFeed, REQUEST_LOG_CAPACITY};
pub use record::{FeedRecord, RawValue};

// Re-export types for convenience
pub use feedwatch_types::Reading;

//! In-memory feed client.
//!
//! [`StaticFeed`] serves canned records without any network access. Records
//! go through the same normalization as live responses, so a static feed
//! behaves like the real service apart from the transport. It can also add
//! an artificial delay to each request and fail chosen feeds, which makes it
//! the stub for refresh-scheduling tests and benchmarks.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use feedwatch_types::{format_feed_timestamp, Reading};

use crate::record::into_readings;
use crate::{FeedClient, FeedError, FeedRecord};

/// A request received by a [`StaticFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    /// `fetch_last(feed_id)`
    Last { feed_id: String },
    /// `fetch_window(feed_id, window_hours)`
    Window { feed_id: String, window_hours: u32 },
}

impl FeedRequest {
    /// The feed this request targeted.
    pub fn feed_id(&self) -> &str {
        match self {
            FeedRequest::Last { feed_id } | FeedRequest::Window { feed_id, .. } => feed_id,
        }
    }
}

/// Requests kept in the log; older ones are dropped first.
pub const REQUEST_LOG_CAPACITY: usize = 256;

/// A feed client backed by canned records.
///
/// Windowed fetches return every record of the feed regardless of the
/// requested window; the records are what the test or demo decided the
/// service would send.
#[derive(Debug, Default)]
pub struct StaticFeed {
    feeds: HashMap<String, Vec<FeedRecord>>,
    failures: HashMap<String, String>,
    latency: Option<Duration>,
    feed_latency: HashMap<String, Duration>,
    requests: Mutex<VecDeque<FeedRequest>>,
}

impl StaticFeed {
    /// Create a static feed with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` (newest first) for `feed_id`.
    pub fn with_feed(
        mut self,
        feed_id: impl Into<String>,
        records: impl IntoIterator<Item = FeedRecord>,
    ) -> Self {
        self.feeds
            .insert(feed_id.into(), records.into_iter().collect());
        self
    }

    /// Serve `count` generated records for `feed_id`, one every `step`,
    /// starting at `newest` and going back in time.
    ///
    /// `value` maps the record index (0 = newest) to the reading value.
    pub fn with_generated(
        self,
        feed_id: impl Into<String>,
        newest: DateTime<Utc>,
        count: usize,
        step: chrono::Duration,
        value: impl Fn(usize) -> f64,
    ) -> Self {
        let records: Vec<FeedRecord> = (0..count)
            .map(|i| {
                let created_at = newest - step * i as i32;
                FeedRecord::new(format_feed_timestamp(created_at), format!("{:.2}", value(i)))
            })
            .collect();
        self.with_feed(feed_id, records)
    }

    /// Make every request for `feed_id` fail with a transport error.
    pub fn with_failure(mut self, feed_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(feed_id.into(), message.into());
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay responses for `feed_id` by `latency`, overriding
    /// [`with_latency`](Self::with_latency) for that feed.
    pub fn with_feed_latency(mut self, feed_id: impl Into<String>, latency: Duration) -> Self {
        self.feed_latency.insert(feed_id.into(), latency);
        self
    }

    /// The most recent requests, in arrival order.
    ///
    /// At most [`REQUEST_LOG_CAPACITY`] are kept.
    pub fn requests(&self) -> Vec<FeedRequest> {
        self.requests.lock().iter().cloned().collect()
    }

    async fn respond(&self, request: FeedRequest) -> Result<Vec<FeedRecord>, FeedError> {
        let feed_id = request.feed_id().to_string();
        {
            let mut log = self.requests.lock();
            if log.len() == REQUEST_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(request);
        }

        if let Some(latency) = self.feed_latency.get(&feed_id).copied().or(self.latency) {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failures.get(&feed_id) {
            return Err(FeedError::Transport(message.clone()));
        }

        self.feeds
            .get(&feed_id)
            .cloned()
            .ok_or_else(|| FeedError::Http {
                status: 404,
                message: format!("feed '{}' not found", feed_id),
            })
    }
}

#[async_trait]
impl FeedClient for StaticFeed {
    async fn fetch_last(&self, feed_id: &str) -> Result<Reading, FeedError> {
        let records = self
            .respond(FeedRequest::Last {
                feed_id: feed_id.to_string(),
            })
            .await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::Format(format!("feed '{}' has no data", feed_id)))?
            .into_reading()
    }

    async fn fetch_window(
        &self,
        feed_id: &str,
        window_hours: u32,
    ) -> Result<Vec<Reading>, FeedError> {
        let records = self
            .respond(FeedRequest::Window {
                feed_id: feed_id.to_string(),
                window_hours,
            })
            .await?;
        into_readings(records)
    }

    fn description(&self) -> &str {
        "static feed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedwatch_types::parse_feed_timestamp;

    fn temp_feed() -> StaticFeed {
        StaticFeed::new().with_feed(
            "temp",
            [
                FeedRecord::new("2024-01-01T12:00:00Z", "21.5"),
                FeedRecord::new("2024-01-01T11:00:00Z", "20.0"),
            ],
        )
    }

    #[tokio::test]
    async fn fetch_last_returns_first_record() {
        let feed = temp_feed();
        let reading = feed.fetch_last("temp").await.unwrap();
        assert_eq!(reading.value, 21.5);
        assert_eq!(reading.timestamp.to_string(), "2024-01-01 04:00:00");
    }

    #[tokio::test]
    async fn fetch_window_keeps_service_order() {
        let feed = temp_feed();
        let readings = feed.fetch_window("temp", 24).await.unwrap();
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![21.5, 20.0]);
    }

    #[tokio::test]
    async fn unknown_feed_is_not_found() {
        let feed = temp_feed();
        let err = feed.fetch_window("humidity", 24).await.unwrap_err();
        assert!(matches!(err, FeedError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn empty_feed_has_no_last() {
        let feed = StaticFeed::new().with_feed("temp", []);
        assert!(feed.fetch_window("temp", 24).await.unwrap().is_empty());
        let err = feed.fetch_last("temp").await.unwrap_err();
        assert!(matches!(err, FeedError::Format(_)));
    }

    #[tokio::test]
    async fn configured_failure() {
        let feed = temp_feed().with_failure("temp", "connection reset");
        let err = feed.fetch_last("temp").await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn malformed_record_is_format_error() {
        let feed = StaticFeed::new().with_feed(
            "temp",
            [
                FeedRecord::new("2024-01-01T12:00:00Z", "21.5"),
                FeedRecord::new("2024-01-01T11:00:00Z", "n/a"),
            ],
        );
        let err = feed.fetch_window("temp", 24).await.unwrap_err();
        assert!(matches!(err, FeedError::Format(_)));
    }

    #[tokio::test]
    async fn records_requests() {
        let feed = temp_feed();
        let _ = feed.fetch_last("temp").await;
        let _ = feed.fetch_window("temp", 6).await;
        assert_eq!(
            feed.requests(),
            vec![
                FeedRequest::Last {
                    feed_id: "temp".into()
                },
                FeedRequest::Window {
                    feed_id: "temp".into(),
                    window_hours: 6
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_response() {
        let feed = temp_feed().with_latency(Duration::from_millis(250));
        let start = tokio::time::Instant::now();
        feed.fetch_last("temp").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn feed_latency_overrides_default() {
        let feed = temp_feed()
            .with_feed("hum", [FeedRecord::new("2024-01-01T12:00:00Z", "45.0")])
            .with_latency(Duration::from_millis(100))
            .with_feed_latency("hum", Duration::from_millis(400));

        let start = tokio::time::Instant::now();
        feed.fetch_last("temp").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(400));

        let start = tokio::time::Instant::now();
        feed.fetch_last("hum").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn request_log_is_bounded() {
        let feed = temp_feed();
        for hours in 0..(REQUEST_LOG_CAPACITY as u32 + 10) {
            let _ = feed.fetch_window("temp", hours).await;
        }

        let requests = feed.requests();
        assert_eq!(requests.len(), REQUEST_LOG_CAPACITY);
        assert_eq!(
            requests[0],
            FeedRequest::Window {
                feed_id: "temp".into(),
                window_hours: 10
            }
        );
    }

    #[tokio::test]
    async fn generated_records_step_back_in_time() {
        let newest = parse_feed_timestamp("2024-01-01T12:00:00Z").unwrap();
        let feed = StaticFeed::new().with_generated(
            "pm25",
            newest,
            4,
            chrono::Duration::minutes(15),
            |i| i as f64,
        );
        let readings = feed.fetch_window("pm25", 24).await.unwrap();
        assert_eq!(readings.len(), 4);
        assert_eq!(readings[0].timestamp.to_string(), "2024-01-01 04:00:00");
        assert_eq!(readings[3].timestamp.to_string(), "2024-01-01 03:15:00");
        assert_eq!(readings[3].value, 3.0);
    }
}

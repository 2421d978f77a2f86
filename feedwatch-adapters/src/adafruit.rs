//! Adafruit IO client using the REST API v2.
//!
//! Feeds are addressed per account:
//!
//! - `GET {endpoint}/{username}/feeds/{feed}/data/last` - most recent point
//! - `GET {endpoint}/{username}/feeds/{feed}/data?limit=N&start_time=T` -
//!   every point created at or after `T`, newest first
//!
//! Requests authenticate with a static `X-AIO-Key` header.
//!
//! ## Example
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
//!     for reading in client.fetch_window("office-temperature.office-humidity", 6).await? {
//!         println!("{}  {:.1}", reading.timestamp, reading.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use feedwatch_types::{format_feed_timestamp, window_start, Reading};

use crate::client::MAX_RECORDS;
use crate::record::into_readings;
use crate::{FeedClient, FeedError, FeedRecord};

/// Base URL of the public Adafruit IO REST API.
pub const DEFAULT_ENDPOINT: &str = "https://io.adafruit.com/api/v2";

/// Header carrying the account key.
const KEY_HEADER: &str = "X-AIO-Key";

/// Adafruit IO client for reading feed data.
///
/// Holds one connection pool; clones share it.
#[derive(Debug, Clone)]
pub struct AdafruitIoClient {
    client: Client,
    endpoint: String,
    username: String,
    key: String,
    record_limit: u32,
    description: String,
}

impl AdafruitIoClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> AdafruitIoClientBuilder {
        AdafruitIoClientBuilder::default()
    }

    /// URL of a feed's data collection, with an optional suffix path.
    fn data_url(&self, feed_id: &str, suffix: &str) -> String {
        format!(
            "{}/{}/feeds/{}/data{}",
            self.endpoint,
            urlencoded(&self.username),
            urlencoded(feed_id),
            suffix
        )
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, FeedError> {
        let response = self
            .client
            .get(url)
            .header(KEY_HEADER, &self.key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FeedError::Auth(format!(
                "API returned status {} for user '{}'",
                status, self.username
            )));
        }

        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl FeedClient for AdafruitIoClient {
    async fn fetch_last(&self, feed_id: &str) -> Result<Reading, FeedError> {
        let url = self.data_url(feed_id, "/last");
        let record: FeedRecord = read_json(self.get(&url, &[]).await?).await?;

        tracing::debug!(feed = feed_id, created_at = %record.created_at, "fetched last data point");
        record.into_reading()
    }

    async fn fetch_window(
        &self,
        feed_id: &str,
        window_hours: u32,
    ) -> Result<Vec<Reading>, FeedError> {
        let url = self.data_url(feed_id, "");
        let start = window_start(Utc::now(), window_hours).ok_or_else(|| {
            FeedError::Config(format!("window of {} hours is out of range", window_hours))
        })?;
        let start_time = format_feed_timestamp(start);
        let query = [
            ("limit", self.record_limit.to_string()),
            ("start_time", start_time),
        ];

        let records: Vec<FeedRecord> = read_json(self.get(&url, &query).await?).await?;

        tracing::debug!(
            feed = feed_id,
            window_hours,
            records = records.len(),
            "fetched feed window"
        );
        into_readings(records)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for AdafruitIoClient.
#[derive(Debug, Default)]
pub struct AdafruitIoClientBuilder {
    endpoint: Option<String>,
    username: Option<String>,
    key: Option<String>,
    timeout: Option<Duration>,
    record_limit: Option<u32>,
}

impl AdafruitIoClientBuilder {
    /// Set the API endpoint (default: [`DEFAULT_ENDPOINT`]).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the account username and key.
    pub fn credentials(mut self, username: impl Into<String>, key: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.key = Some(key.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the page size for windowed fetches (capped at [`MAX_RECORDS`]).
    pub fn record_limit(mut self, limit: u32) -> Self {
        self.record_limit = Some(limit);
        self
    }

    /// Build the client.
    ///
    /// Fails if credentials are missing or blank, or if the HTTP client
    /// cannot be initialized.
    pub fn build(self) -> Result<AdafruitIoClient, FeedError> {
        let (username, key) = match (self.username, self.key) {
            (Some(u), Some(k)) if !u.trim().is_empty() && !k.trim().is_empty() => (u, k),
            _ => return Err(FeedError::Config("username and key are required".to_string())),
        };

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let description = format!("adafruit-io: {}@{}", username, endpoint);

        Ok(AdafruitIoClient {
            client,
            endpoint,
            username,
            key,
            record_limit: self.record_limit.unwrap_or(MAX_RECORDS).clamp(1, MAX_RECORDS),
            description,
        })
    }
}

/// Read the whole body, then decode it.
///
/// A body cut short is a transport failure; only a complete body that does
/// not match `T` is a format error.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FeedError> {
    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FeedError::Timeout
        } else {
            FeedError::Transport(e.to_string())
        }
    })?;
    serde_json::from_slice(&body).map_err(|e| FeedError::Format(e.to_string()))
}

// URL encode a string for use in paths
fn urlencoded(s: &str) -> String {
    s.replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a local port.
    ///
    /// Returns the endpoint URL and a handle resolving to the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        serve_raw(format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        ))
        .await
    }

    /// Write `response` verbatim after reading the request head, then close.
    async fn serve_raw(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn client_for(endpoint: &str) -> AdafruitIoClient {
        AdafruitIoClient::builder()
            .endpoint(endpoint)
            .credentials("alice", "secret-key")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = AdafruitIoClient::builder()
            .credentials("alice", "secret-key")
            .build()
            .unwrap();
        assert_eq!(client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(client.username, "alice");
        assert_eq!(client.key, "secret-key");
        assert_eq!(client.record_limit, MAX_RECORDS);
        assert_eq!(
            client.description(),
            "adafruit-io: alice@https://io.adafruit.com/api/v2"
        );
    }

    #[test]
    fn test_builder_custom() {
        let client = AdafruitIoClient::builder()
            .endpoint("http://aio.local/api/v2/")
            .credentials("bob", "k")
            .record_limit(5000)
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert_eq!(client.endpoint, "http://aio.local/api/v2");
        assert_eq!(client.record_limit, MAX_RECORDS);
    }

    #[test]
    fn test_builder_requires_credentials() {
        let err = AdafruitIoClient::builder().build().unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));

        let err = AdafruitIoClient::builder()
            .credentials("alice", "  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_data_url() {
        let client = client_for("https://io.adafruit.com/api/v2");
        assert_eq!(
            client.data_url("office-temperature.office-humidity", "/last"),
            "https://io.adafruit.com/api/v2/alice/feeds/office-temperature.office-humidity/data/last"
        );
        assert_eq!(
            client.data_url("air-quality-pm25", ""),
            "https://io.adafruit.com/api/v2/alice/feeds/air-quality-pm25/data"
        );
    }

    #[test]
    fn test_urlencoded() {
        assert_eq!(urlencoded("group/feed"), "group%2Ffeed");
        assert_eq!(urlencoded("simple"), "simple");
    }

    #[tokio::test]
    async fn test_fetch_last_sends_key_header() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"id":"0EXZ","value":"21.5","feed_id":1,"created_at":"2024-01-01T12:00:00Z"}"#,
        )
        .await;
        let client = client_for(&endpoint);

        let reading = client.fetch_last("temp").await.unwrap();
        assert_eq!(reading.value, 21.5);
        assert_eq!(reading.timestamp.to_string(), "2024-01-01 04:00:00");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /alice/feeds/temp/data/last HTTP/1.1\r\n"));
        assert!(request.to_lowercase().contains("x-aio-key: secret-key\r\n"));
    }

    #[tokio::test]
    async fn test_fetch_window_query() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"[{"created_at":"2024-01-01T12:00:00Z","value":"21.5"},
                {"created_at":"2024-01-01T11:00:00Z","value":"20.0"}]"#,
        )
        .await;
        let client = client_for(&endpoint);

        let readings = client.fetch_window("temp", 24).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].value, 21.5);
        assert_eq!(readings[1].timestamp.to_string(), "2024-01-01 03:00:00");

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /alice/feeds/temp/data?"));
        assert!(request_line.contains("limit=1000"));
        assert!(request_line.contains("start_time="));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let (endpoint, _server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let err = client_for(&endpoint).fetch_last("temp").await.unwrap_err();
        assert!(matches!(err, FeedError::Auth(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_http_error() {
        let (endpoint, _server) = serve_once("404 Not Found", r#"{"error":"not found"}"#).await;
        let err = client_for(&endpoint)
            .fetch_window("missing", 24)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_missing_value_is_format_error() {
        let (endpoint, _server) =
            serve_once("200 OK", r#"{"created_at":"2024-01-01T12:00:00Z"}"#).await;
        let err = client_for(&endpoint).fetch_last("temp").await.unwrap_err();
        assert!(matches!(err, FeedError::Format(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_transport_error() {
        let (endpoint, _server) = serve_raw(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n[{\"created_at\":"
                .to_string(),
        )
        .await;
        let err = client_for(&endpoint)
            .fetch_window("temp", 24)
            .await
            .unwrap_err();
        assert!(err.is_transport(), "{err}");
    }

    #[tokio::test]
    async fn test_window_out_of_range_is_rejected_before_request() {
        // Nothing listens here; the window check fails first.
        let err = client_for("http://127.0.0.1:9")
            .fetch_window("temp", u32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Config(_)), "{err}");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .fetch_last("temp")
            .await
            .unwrap_err();
        assert!(err.is_transport(), "{err}");
    }
}

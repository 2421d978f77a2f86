//! The feed client abstraction.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use feedwatch_types::Reading;

use crate::FeedError;

/// Largest page the feed service returns for one request.
///
/// Windowed fetches ask for this many records and never page further, so a
/// window holding more data points is silently truncated to the newest ones.
pub const MAX_RECORDS: u32 = 1000;

/// Trait for fetching readings from a feed service.
///
/// Each call is one bounded request with no retry. Implementations must be
/// shareable across tasks: a suite refresh issues several fetches through
/// one client at the same time.
///
/// # Example
///
/// ```
/// use feedwatch_adapters::{FeedClient, FeedRecord, StaticFeed};
///
/// # tokio_test::block_on(async {
/// let feed = StaticFeed::new().with_feed(
///     "temp",
///     [FeedRecord::new("2024-01-01T12:00:00Z", "21.5")],
/// );
/// let last = feed.fetch_last("temp").await.unwrap();
/// assert_eq!(last.value, 21.5);
/// # });
/// ```
#[async_trait]
pub trait FeedClient: Send + Sync + Debug {
    /// Fetch the single most recent data point of a feed.
    async fn fetch_last(&self, feed_id: &str) -> Result<Reading, FeedError>;

    /// Fetch every data point from the last `window_hours` hours.
    ///
    /// At most [`MAX_RECORDS`] readings are returned, in the order the
    /// service sent them (newest first). They are not re-sorted.
    async fn fetch_window(&self, feed_id: &str, window_hours: u32)
        -> Result<Vec<Reading>, FeedError>;

    /// Returns a human-readable description of the client.
    ///
    /// Used for display in the dashboard status bar.
    fn description(&self) -> &str;
}

#[async_trait]
impl<T: FeedClient + ?Sized> FeedClient for Arc<T> {
    async fn fetch_last(&self, feed_id: &str) -> Result<Reading, FeedError> {
        (**self).fetch_last(feed_id).await
    }

    async fn fetch_window(
        &self,
        feed_id: &str,
        window_hours: u32,
    ) -> Result<Vec<Reading>, FeedError> {
        (**self).fetch_window(feed_id, window_hours).await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

//! Background refresh task feeding a [`ChannelSource`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use feedwatch_adapters::FeedClient;

use super::ChannelSource;
use crate::data::{SensorSuite, SuiteSnapshot};

/// Refresh the suite once and snapshot the result.
///
/// An aborted refresh is logged and recorded in the snapshot; sensors keep
/// whatever data they had.
pub async fn refresh_snapshot<C>(suite: &mut SensorSuite, client: &C) -> SuiteSnapshot
where
    C: FeedClient + ?Sized,
{
    if let Err(err) = suite.refresh_all(client).await {
        tracing::warn!(sensor = %err.sensor, error = %err.source, "refresh aborted");
    }
    suite.snapshot()
}

/// Spawn a task that owns `suite` and refreshes it every `interval`.
///
/// The first refresh starts immediately. Each refresh publishes a snapshot
/// to the returned source, and [`DataSource::request_refresh`] on the source
/// triggers an extra refresh. The task ends once the source is dropped.
///
/// [`DataSource::request_refresh`]: super::DataSource::request_refresh
pub fn spawn_poller(
    mut suite: SensorSuite,
    client: Arc<dyn FeedClient>,
    interval: Duration,
) -> (ChannelSource, JoinHandle<()>) {
    let (tx, source) = ChannelSource::create(client.description());
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
    let source = source.with_trigger(trigger_tx);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                Some(()) = trigger_rx.recv() => ticker.reset(),
            }

            let snapshot = refresh_snapshot(&mut suite, client.as_ref()).await;
            if tx.send(Some(snapshot)).is_err() {
                tracing::debug!("snapshot receiver dropped, stopping refresh task");
                break;
            }
        }
    });

    (source, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FailurePolicy, Sensor};
    use crate::source::DataSource;
    use feedwatch_adapters::{FeedRecord, StaticFeed};

    fn feed() -> Arc<StaticFeed> {
        Arc::new(
            StaticFeed::new()
                .with_feed("temp", [FeedRecord::new("2024-01-01T12:00:00Z", "21.5")])
                .with_failure("hum", "connection reset"),
        )
    }

    async fn next_snapshot(source: &mut ChannelSource) -> SuiteSnapshot {
        loop {
            if let Some(snapshot) = source.poll() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn refresh_snapshot_records_abort() {
        let mut suite = SensorSuite::new(vec![Sensor::new("temp", "temp"), Sensor::new("hum", "hum")]);
        let snapshot = refresh_snapshot(&mut suite, feed().as_ref()).await;

        assert_eq!(snapshot.sensors.len(), 2);
        assert_eq!(snapshot.sensors[0].count, 1);
        assert!(snapshot.error.is_some());
        assert!(snapshot.sensors[1].error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn poller_publishes_and_refreshes_on_demand() {
        let feed = feed();
        let suite = SensorSuite::new(vec![Sensor::new("temp", "temp"), Sensor::new("hum", "hum")])
            .with_policy(FailurePolicy::Continue);
        let (mut source, handle) = spawn_poller(suite, feed.clone(), Duration::from_secs(3600));

        assert_eq!(source.description(), "static feed");
        let first = next_snapshot(&mut source).await;
        assert_eq!(first.sensors[0].last.map(|r| r.value), Some(21.5));
        assert!(first.error.is_none());
        assert_eq!(feed.requests().len(), 2);

        assert!(source.request_refresh());
        next_snapshot(&mut source).await;
        assert_eq!(feed.requests().len(), 4);

        drop(source);
        handle.abort();
    }
}

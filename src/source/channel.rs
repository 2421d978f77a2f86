//! Channel-based data source.
//!
//! Receives suite snapshots via a tokio watch channel. The producer is
//! normally the refresh task started by [`spawn_poller`](super::spawn_poller).

use tokio::sync::{mpsc, watch};

use super::DataSource;
use crate::data::SuiteSnapshot;

/// A data source that receives suite snapshots via a channel.
///
/// The watch channel starts out empty (`None`) until the producer publishes
/// its first snapshot. An optional trigger channel lets the dashboard ask
/// the producer for an out-of-schedule refresh.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Option<SuiteSnapshot>>,
    trigger: Option<mpsc::Sender<()>>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where snapshots come from, e.g. the feed
    ///   client's description
    pub fn new(receiver: watch::Receiver<Option<SuiteSnapshot>>, source_description: &str) -> Self {
        Self {
            receiver,
            trigger: None,
            description: source_description.to_string(),
            last_error: None,
        }
    }

    /// Attach a trigger used by [`DataSource::request_refresh`].
    pub fn with_trigger(mut self, trigger: mpsc::Sender<()>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Create a channel pair for publishing snapshots to a ChannelSource.
    pub fn create(source_description: &str) -> (watch::Sender<Option<SuiteSnapshot>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<SuiteSnapshot> {
        if !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }
        let snapshot = self.receiver.borrow_and_update().clone()?;
        self.last_error = snapshot.error.clone();
        Some(snapshot)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn request_refresh(&mut self) -> bool {
        match &self.trigger {
            // A full queue means a refresh is already pending.
            Some(trigger) => !matches!(
                trigger.try_send(()),
                Err(mpsc::error::TrySendError::Closed(_))
            ),
            None => false,
        }
    }
}

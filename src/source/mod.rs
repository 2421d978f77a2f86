//! Data source abstraction for the dashboard.
//!
//! The dashboard never talks to the feed service itself. It polls a
//! [`DataSource`] for the latest [`SuiteSnapshot`], which keeps the render
//! loop free of network waits.

mod channel;
mod poller;

pub use channel::ChannelSource;
pub use poller::{refresh_snapshot, spawn_poller};

use std::fmt::Debug;

use crate::data::SuiteSnapshot;

/// Trait for receiving suite snapshots.
///
/// # Example
///
/// ```
/// use feedwatch::{ChannelSource, DataSource};
///
/// let (_tx, mut source) = ChannelSource::create("static feed");
/// // Nothing has been published yet.
/// assert!(source.poll().is_none());
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if a new snapshot is available, `None`
    /// otherwise. This method must not block.
    fn poll(&mut self) -> Option<SuiteSnapshot>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the status bar.
    fn description(&self) -> &str;

    /// Returns the error from the last refresh, if it failed as a whole.
    fn error(&self) -> Option<&str>;

    /// Ask the producer for an immediate refresh.
    ///
    /// Returns `false` when the source cannot be refreshed on demand.
    fn request_refresh(&mut self) -> bool {
        false
    }
}

//! Sensors, the suite that refreshes them, and snapshots of their values.
//!
//! ## Submodules
//!
//! - [`sensor`]: one feed and its latest window ([`Sensor`])
//! - [`suite`]: ordered sensors refreshed under a [`Schedule`] and [`FailurePolicy`]
//! - [`snapshot`]: presentation copies ([`SuiteSnapshot`], [`SensorSnapshot`])
//!
//! ## Data Flow
//!
//! ```text
//! SensorSuite::refresh_all()
//!        │
//!        ├──▶ Sensor::refresh() ──▶ FeedClient::fetch_window()
//!        │
//!        ▼
//! SensorSuite::snapshot() ──▶ SuiteSnapshot (console, dashboard, export)
//! ```

pub mod sensor;
pub mod snapshot;
pub mod suite;

pub use sensor::{Sensor, SensorError, DEFAULT_WINDOW_HOURS};
pub use snapshot::{Freshness, SensorSnapshot, SuiteSnapshot};
pub use suite::{FailurePolicy, Latest, RefreshError, RefreshReport, Schedule, SensorSuite};

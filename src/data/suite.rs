//! An ordered set of sensors refreshed together.

use std::fmt;

use chrono::NaiveDateTime;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use feedwatch_adapters::{FeedClient, FeedError};
use feedwatch_types::{local_now, Reading};

use super::sensor::Sensor;
use super::snapshot::SuiteSnapshot;

/// How the fetches of one refresh are issued.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Await each fetch before issuing the next.
    Sequential,
    /// Issue every fetch, then wait for all of them.
    #[default]
    Concurrent,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Sequential => write!(f, "sequential"),
            Schedule::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// What a refresh does when one sensor's fetch fails.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report the first failure as the refresh result.
    #[default]
    Abort,
    /// Keep stale data for failing sensors and report them alongside.
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

/// A sensor whose fetch failed.
#[derive(Debug, Error)]
#[error("failed to refresh sensor '{sensor}'")]
pub struct RefreshError {
    pub sensor: String,
    #[source]
    pub source: FeedError,
}

/// Outcome of a [`SensorSuite::refresh_all`] that did not abort.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Sensors whose readings were replaced.
    pub refreshed: usize,
    /// Sensors that kept stale readings, in suite order.
    pub failed: Vec<RefreshError>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The latest reading of one sensor, as fetched by
/// [`SensorSuite::fetch_latest`].
#[derive(Debug)]
pub struct Latest {
    pub name: String,
    pub unit: Option<String>,
    pub reading: Result<Reading, FeedError>,
}

/// Sensors in display order, with the schedule and failure policy used to
/// refresh them.
///
/// The set of sensors is fixed at construction. One shared client serves
/// every fetch of a refresh.
#[derive(Debug)]
pub struct SensorSuite {
    sensors: Vec<Sensor>,
    schedule: Schedule,
    policy: FailurePolicy,
    last_errors: Vec<Option<String>>,
    aborted: Option<String>,
}

impl SensorSuite {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        let last_errors = vec![None; sensors.len()];
        Self {
            sensors,
            schedule: Schedule::default(),
            policy: FailurePolicy::default(),
            last_errors,
            aborted: None,
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Refresh every sensor through `client`.
    ///
    /// With [`Schedule::Concurrent`] all fetches run to completion before the
    /// failure policy is applied, so sensors that succeeded keep their new
    /// data even when the refresh reports an error. With
    /// [`Schedule::Sequential`] and [`FailurePolicy::Abort`], sensors after
    /// the first failure are not fetched.
    pub async fn refresh_all<C>(&mut self, client: &C) -> Result<RefreshReport, RefreshError>
    where
        C: FeedClient + ?Sized,
    {
        let outcomes: Vec<Option<Result<usize, FeedError>>> = match self.schedule {
            Schedule::Sequential => {
                let mut outcomes = Vec::with_capacity(self.sensors.len());
                for sensor in self.sensors.iter_mut() {
                    let result = sensor.refresh(client).await.map(|r| r.len());
                    let stop = result.is_err() && self.policy == FailurePolicy::Abort;
                    outcomes.push(Some(result));
                    if stop {
                        break;
                    }
                }
                outcomes.resize_with(self.sensors.len(), || None);
                outcomes
            }
            Schedule::Concurrent => {
                let fetches = self.sensors.iter_mut().map(|sensor| async move {
                    Some(sensor.refresh(client).await.map(|r| r.len()))
                });
                join_all(fetches).await
            }
        };

        let mut report = RefreshReport::default();
        let mut skipped = 0;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let sensor = self.sensors[i].name().to_string();
            match outcome {
                Some(Ok(_)) => {
                    self.last_errors[i] = None;
                    report.refreshed += 1;
                }
                Some(Err(source)) => {
                    tracing::warn!(sensor = %sensor, error = %source, "sensor refresh failed");
                    self.last_errors[i] = Some(source.to_string());
                    report.failed.push(RefreshError { sensor, source });
                }
                None => skipped += 1,
            }
        }

        tracing::info!(
            schedule = %self.schedule,
            refreshed = report.refreshed,
            failed = report.failed.len(),
            skipped,
            "suite refreshed"
        );

        if self.policy == FailurePolicy::Abort && !report.failed.is_empty() {
            let first = report.failed.remove(0);
            self.aborted = Some(format!("{}: {}", first, first.source));
            return Err(first);
        }
        self.aborted = None;
        Ok(report)
    }

    /// Fetch only the latest reading of every sensor, under the suite's
    /// schedule. Stored readings are not touched.
    ///
    /// With [`FailurePolicy::Abort`] the first failure is returned instead of
    /// the list, and a sequential fetch stops there. With
    /// [`FailurePolicy::Continue`] failures stay in the list.
    pub async fn fetch_latest<C>(&self, client: &C) -> Result<Vec<Latest>, RefreshError>
    where
        C: FeedClient + ?Sized,
    {
        let readings = match self.schedule {
            Schedule::Sequential => {
                let mut readings = Vec::with_capacity(self.sensors.len());
                for sensor in &self.sensors {
                    let reading = client.fetch_last(sensor.feed_id()).await;
                    let stop = reading.is_err() && self.policy == FailurePolicy::Abort;
                    readings.push(reading);
                    if stop {
                        break;
                    }
                }
                readings
            }
            Schedule::Concurrent => {
                join_all(self.sensors.iter().map(|s| client.fetch_last(s.feed_id()))).await
            }
        };

        let mut latest = Vec::with_capacity(readings.len());
        for (sensor, reading) in self.sensors.iter().zip(readings) {
            match reading {
                Err(source) if self.policy == FailurePolicy::Abort => {
                    tracing::warn!(sensor = sensor.name(), error = %source, "latest fetch failed");
                    return Err(RefreshError {
                        sensor: sensor.name().to_string(),
                        source,
                    });
                }
                reading => latest.push(Latest {
                    name: sensor.name().to_string(),
                    unit: sensor.unit().map(str::to_string),
                    reading,
                }),
            }
        }
        Ok(latest)
    }

    /// Snapshot every sensor, stamped with the current local time.
    pub fn snapshot(&self) -> SuiteSnapshot {
        self.snapshot_at(local_now())
    }

    /// Snapshot every sensor, stamped with `taken_at`.
    pub fn snapshot_at(&self, taken_at: NaiveDateTime) -> SuiteSnapshot {
        let sensors = self
            .sensors
            .iter()
            .zip(&self.last_errors)
            .map(|(sensor, error)| {
                let mut snapshot = sensor.snapshot();
                snapshot.error = error.clone();
                snapshot
            })
            .collect();
        SuiteSnapshot {
            taken_at,
            sensors,
            error: self.aborted.clone(),
        }
    }
}

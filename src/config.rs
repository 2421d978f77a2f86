//! Runtime settings.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults (the five office sensors, a 24 hour window)
//! 2. a TOML file: `--config PATH`, or `feedwatch.toml` in the working
//!    directory when present
//! 3. `ADAFRUIT_IO_USERNAME` / `ADAFRUIT_IO_KEY`
//! 4. `FEEDWATCH_*` variables, e.g. `FEEDWATCH_WINDOW_HOURS=6` or
//!    `FEEDWATCH_SCHEDULE=sequential`
//!
//! A `.env` file is loaded into the environment by the binary before the
//! settings are read.
//!
//! ```toml
//! window_hours = 12
//! schedule = "concurrent"
//! on_error = "continue"
//!
//! [[sensors]]
//! name = "temperature"
//! feed = "office-temperature.office-temperature"
//! unit = "C"
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use feedwatch_adapters::adafruit::{AdafruitIoClient, DEFAULT_ENDPOINT};
use feedwatch_adapters::FeedError;
use feedwatch_types::MAX_WINDOW_HOURS;

use crate::data::{FailurePolicy, Schedule, Sensor, SensorSuite, DEFAULT_WINDOW_HOURS};

/// Settings file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_NAME: &str = "feedwatch";

pub const KEY_VAR: &str = "ADAFRUIT_IO_KEY";
pub const USERNAME_VAR: &str = "ADAFRUIT_IO_USERNAME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),

    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("no sensors configured")]
    NoSensors,

    #[error("failed to build feed client: {0}")]
    Client(#[from] FeedError),
}

/// One configured sensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Display name.
    pub name: String,
    /// Feed key on the service (`group.feed` for grouped feeds).
    pub feed: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Per-sensor window; falls back to [`Settings::window_hours`].
    #[serde(default)]
    pub window_hours: Option<u32>,
}

impl SensorConfig {
    pub fn new(name: &str, feed: &str, unit: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            feed: feed.to_string(),
            unit: unit.map(str::to_string),
            window_hours: None,
        }
    }
}

/// The sensors watched when none are configured.
pub fn default_sensors() -> Vec<SensorConfig> {
    vec![
        SensorConfig::new("humidity", "office-temperature.office-humidity", Some("%")),
        SensorConfig::new("temperature", "office-temperature.office-temperature", Some("C")),
        SensorConfig::new("pm10", "air-quality-pm10", None),
        SensorConfig::new("pm25", "air-quality-pm25", None),
        SensorConfig::new("pm100", "air-quality-pm100", None),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub username: Option<String>,
    pub key: Option<String>,
    /// API base URL.
    pub endpoint: String,
    /// Hours of history per refresh.
    pub window_hours: u32,
    pub schedule: Schedule,
    pub on_error: FailurePolicy,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Dashboard refresh interval.
    pub refresh_secs: u64,
    /// Minutes after which a last reading is shown as stale.
    pub stale_after_minutes: i64,
    pub sensors: Vec<SensorConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: None,
            key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            window_hours: DEFAULT_WINDOW_HOURS,
            schedule: Schedule::default(),
            on_error: FailurePolicy::default(),
            timeout_secs: 10,
            refresh_secs: 60,
            stale_after_minutes: 30,
            sensors: default_sensors(),
        }
    }
}

impl Settings {
    /// Load settings from the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("ADAFRUIT_IO"))
            .add_source(
                Environment::with_prefix("FEEDWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize and validate an already built [`Config`].
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(
            sensors = settings.sensors.len(),
            window_hours = settings.window_hours,
            schedule = %settings.schedule,
            "settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        window("window_hours", self.window_hours)?;
        positive("timeout_secs", self.timeout_secs)?;
        positive("refresh_secs", self.refresh_secs)?;
        for sensor in &self.sensors {
            if sensor.name.trim().is_empty() || sensor.feed.trim().is_empty() {
                return Err(ConfigError::InvalidSetting {
                    name: "sensors".into(),
                    reason: "every sensor needs a name and a feed".into(),
                });
            }
            if let Some(hours) = sensor.window_hours {
                window(&format!("sensors.{}.window_hours", sensor.name), hours)?;
            }
        }
        Ok(())
    }

    /// The username and key, both required for talking to the service.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let username = present(self.username.as_deref())
            .ok_or(ConfigError::MissingCredential(USERNAME_VAR))?;
        let key =
            present(self.key.as_deref()).ok_or(ConfigError::MissingCredential(KEY_VAR))?;
        Ok((username, key))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Build the configured sensors into a suite.
    pub fn build_suite(&self) -> SensorSuite {
        let sensors = self
            .sensors
            .iter()
            .map(|config| {
                let sensor = Sensor::new(&config.name, &config.feed)
                    .with_window_hours(config.window_hours.unwrap_or(self.window_hours));
                match &config.unit {
                    Some(unit) => sensor.with_unit(unit),
                    None => sensor,
                }
            })
            .collect();
        SensorSuite::new(sensors)
            .with_schedule(self.schedule)
            .with_policy(self.on_error)
    }

    /// Build a client for the configured account.
    pub fn build_client(&self) -> Result<AdafruitIoClient, ConfigError> {
        let (username, key) = self.credentials()?;
        let client = AdafruitIoClient::builder()
            .endpoint(&self.endpoint)
            .credentials(username, key)
            .timeout(self.timeout())
            .build()?;
        Ok(client)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

fn window(name: &str, hours: u32) -> Result<(), ConfigError> {
    positive(name, u64::from(hours))?;
    if hours > MAX_WINDOW_HOURS {
        return Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            reason: format!("must be at most {} hours", MAX_WINDOW_HOURS),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Settings::from_config(config)
    }

    #[test]
    fn defaults() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.window_hours, 24);
        assert_eq!(settings.schedule, Schedule::Concurrent);
        assert_eq!(settings.on_error, FailurePolicy::Abort);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);

        let names: Vec<&str> = settings.sensors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["humidity", "temperature", "pm10", "pm25", "pm100"]);
        assert_eq!(settings.sensors[1].feed, "office-temperature.office-temperature");
    }

    #[test]
    fn missing_credentials() {
        let settings = from_toml("").unwrap();
        assert!(matches!(
            settings.credentials(),
            Err(ConfigError::MissingCredential(USERNAME_VAR))
        ));

        let settings = from_toml("username = \"me\"\nkey = \"  \"").unwrap();
        assert!(matches!(
            settings.credentials(),
            Err(ConfigError::MissingCredential(KEY_VAR))
        ));
        assert!(settings.build_client().is_err());
    }

    #[test]
    fn credentials_present() {
        let settings = from_toml("username = \"me\"\nkey = \"aio_123\"").unwrap();
        assert_eq!(settings.credentials().unwrap(), ("me", "aio_123"));
        assert!(settings.build_client().is_ok());
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
window_hours = 6
schedule = "sequential"
on_error = "continue"

[[sensors]]
name = "temperature"
feed = "temp"
unit = "C"

[[sensors]]
name = "pm25"
feed = "air-quality-pm25"
window_hours = 2
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.window_hours, 6);
        assert_eq!(settings.schedule, Schedule::Sequential);
        assert_eq!(settings.on_error, FailurePolicy::Continue);

        let suite = settings.build_suite();
        assert_eq!(suite.schedule(), Schedule::Sequential);
        assert_eq!(suite.policy(), FailurePolicy::Continue);
        assert_eq!(suite.sensors()[0].window_hours(), 6);
        assert_eq!(suite.sensors()[0].unit(), Some("C"));
        assert_eq!(suite.sensors()[1].window_hours(), 2);
        assert_eq!(suite.sensors()[1].unit(), None);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        drop(file);
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_empty_sensor_list() {
        assert!(matches!(from_toml("sensors = []"), Err(ConfigError::NoSensors)));
    }

    #[test]
    fn rejects_zero_window() {
        let err = from_toml("window_hours = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { ref name, .. } if name == "window_hours"));
    }

    #[test]
    fn rejects_window_past_maximum() {
        let err = from_toml("window_hours = 4294967295").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { ref name, .. } if name == "window_hours"));

        let err = from_toml(
            r#"
            [[sensors]]
            name = "pm25"
            feed = "air-quality-pm25"
            window_hours = 100000
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidSetting { ref name, .. } if name == "sensors.pm25.window_hours")
        );
    }

    #[test]
    fn rejects_unknown_schedule() {
        assert!(matches!(
            from_toml("schedule = \"parallel\""),
            Err(ConfigError::Invalid(_))
        ));
    }
}

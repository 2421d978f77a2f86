//! Dashboard state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::{SensorSnapshot, SuiteSnapshot};
use crate::source::DataSource;
use crate::ui::summary::{sort_sensors_by, SortColumn};
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub snapshot: Option<SuiteSnapshot>,
    pub last_updated: Option<Instant>,
    pub load_error: Option<String>,
    pub stale_after_minutes: i64,

    // Navigation state (visual row in the sorted table)
    pub selected_index: usize,

    // Sorting
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App for the given data source, detecting the theme.
    pub fn new(source: Box<dyn DataSource>, stale_after_minutes: i64) -> Self {
        Self::with_theme(source, stale_after_minutes, Theme::auto_detect())
    }

    pub fn with_theme(source: Box<dyn DataSource>, stale_after_minutes: i64, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            source,
            snapshot: None,
            last_updated: None,
            load_error: None,
            stale_after_minutes,
            selected_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Poll the data source for a new snapshot.
    ///
    /// Returns true if a new snapshot was received.
    pub fn reload_data(&mut self) -> bool {
        let Some(snapshot) = self.source.poll() else {
            return false;
        };

        self.load_error = self.source.error().map(str::to_string);
        if self.selected_index >= snapshot.sensors.len() {
            self.selected_index = snapshot.sensors.len().saturating_sub(1);
        }
        self.snapshot = Some(snapshot);
        self.last_updated = Some(Instant::now());
        true
    }

    /// Ask the source for an immediate refresh.
    pub fn request_refresh(&mut self) {
        if self.source.request_refresh() {
            self.set_status_message("Refreshing...".to_string());
        } else {
            self.set_status_message("Refresh not available".to_string());
        }
    }

    /// Sensors in display order.
    pub fn sorted_sensors(&self) -> Vec<&SensorSnapshot> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        let mut sensors: Vec<&SensorSnapshot> = snapshot.sensors.iter().collect();
        sort_sensors_by(
            &mut sensors,
            self.sort_column,
            self.sort_ascending,
            snapshot.taken_at,
            self.stale_after_minutes,
        );
        sensors
    }

    /// The sensor on the selected row.
    pub fn selected_sensor(&self) -> Option<&SensorSnapshot> {
        self.sorted_sensors().get(self.selected_index).copied()
    }

    fn sensor_count(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.sensors.len())
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.sensor_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.sensor_count().saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column.
    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current snapshot to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref snapshot) = self.snapshot else {
            anyhow::bail!("No data to export");
        };
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

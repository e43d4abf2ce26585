use std::{fs, path::Path};

use chrono::Weekday;
use thiserror::Error;

use crate::layout::GridGeometry;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    pub grid: GridGeometry,
    pub calendar: CalendarSettings,
    pub booking: BookingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub first_weekday: Weekday,
    /// Events listed in a month-view day cell before the overflow count.
    pub month_visible_events: usize,
    /// Hour used when a day is picked without an hour grid.
    pub default_hour: u32,
    pub quick_duration_minutes: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            first_weekday: Weekday::Mon,
            month_visible_events: 3,
            default_hour: 9,
            quick_duration_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct BookingSettings {
    pub policy: BookingPolicy,
}

/// Whether a resource may hold overlapping planning items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingPolicy {
    #[default]
    AllowOverlap,
    RejectOverlap,
}

impl Settings {
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Invalid(msg));
        let grid = &self.grid;

        if grid.window_start_hour >= grid.window_end_hour || grid.window_end_hour > 24 {
            return invalid(format!(
                "grid window {}..{} must be a non-empty range within 0..24",
                grid.window_start_hour, grid.window_end_hour
            ));
        }
        if !(grid.hour_height.is_finite() && grid.hour_height > 0.0) {
            return invalid(format!("hour_height must be positive, got {}", grid.hour_height));
        }
        if !(grid.min_event_height.is_finite() && grid.min_event_height >= 0.0) {
            return invalid(format!(
                "min_event_height must not be negative, got {}",
                grid.min_event_height
            ));
        }
        if self.calendar.default_hour >= 24 {
            return invalid(format!(
                "default_hour must be below 24, got {}",
                self.calendar.default_hour
            ));
        }
        if self.calendar.quick_duration_minutes == 0 {
            return invalid("quick_duration_minutes must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.grid.window_start_hour, 8);
        assert_eq!(settings.grid.window_end_hour, 22);
        assert_eq!(settings.booking.policy, BookingPolicy::AllowOverlap);
    }

    #[test]
    fn test_partial_settings() {
        let settings = Settings::from_toml_str(
            r#"
            [grid]
            hour_height = 40.0

            [calendar]
            first_weekday = "Sun"
            month_visible_events = 2

            [booking]
            policy = "reject-overlap"
            "#,
        )
        .unwrap();

        assert_eq!(settings.grid.hour_height, 40.0);
        assert_eq!(settings.grid.min_event_height, 20.0);
        assert_eq!(settings.calendar.first_weekday, Weekday::Sun);
        assert_eq!(settings.calendar.month_visible_events, 2);
        assert_eq!(settings.calendar.default_hour, 9);
        assert_eq!(settings.booking.policy, BookingPolicy::RejectOverlap);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for source in [
            "[grid]\nwindow_start_hour = 20\nwindow_end_hour = 8",
            "[grid]\nwindow_end_hour = 25",
            "[grid]\nhour_height = -60.0",
            "[grid]\nhour_height = 0.0",
            "[calendar]\ndefault_hour = 30",
            "[calendar]\nquick_duration_minutes = 0",
        ] {
            let err = Settings::from_toml_str(source).unwrap_err();
            assert!(matches!(err, SettingsError::Invalid(_)), "{source}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.toml");
        std::fs::write(&path, "[calendar]\nfirst_weekday = \"Sun\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.calendar.first_weekday, Weekday::Sun);

        std::fs::write(&path, "[calendar]\ndefault_hour = 24\n").unwrap();
        assert!(matches!(Settings::load(&path), Err(SettingsError::Invalid(_))));

        let missing = Settings::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, SettingsError::Io(_)));
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::from_toml_str("[calendar]\nfirst_weekday = 7").unwrap_err();
        assert!(matches!(err, SettingsError::Toml(_)));
    }
}

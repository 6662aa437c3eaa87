//! Timer settings and the store that guards them.
//!
//! Settings are only ever replaced wholesale through [`SettingsStore::apply`],
//! which validates every field first. A rejected apply leaves the store
//! untouched.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const STUDY_DURATION_RANGE: RangeInclusive<u32> = 1..=60;
pub const SHORT_BREAK_RANGE: RangeInclusive<u32> = 1..=30;
pub const LONG_BREAK_RANGE: RangeInclusive<u32> = 1..=60;
pub const LONG_BREAK_INTERVAL_RANGE: RangeInclusive<u32> = 1..=10;

/// User-adjustable timer configuration.
///
/// Stored as the `[timer]` table of `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_study_duration")]
    pub study_duration_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    /// Completed work cycles between long breaks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_next_work: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_study_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            study_duration_minutes: default_study_duration(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            long_break_interval: default_long_break_interval(),
            auto_start_breaks: true,
            auto_start_next_work: false,
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Check every numeric field against its declared range.
    ///
    /// # Errors
    ///
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check(
            "study_duration_minutes",
            self.study_duration_minutes,
            STUDY_DURATION_RANGE,
        )?;
        check(
            "short_break_minutes",
            self.short_break_minutes,
            SHORT_BREAK_RANGE,
        )?;
        check(
            "long_break_minutes",
            self.long_break_minutes,
            LONG_BREAK_RANGE,
        )?;
        check(
            "long_break_interval",
            self.long_break_interval,
            LONG_BREAK_INTERVAL_RANGE,
        )?;
        Ok(())
    }
}

fn check(
    field: &'static str,
    value: u32,
    range: RangeInclusive<u32>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Holder of the active [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    current: Settings,
}

impl SettingsStore {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `settings` is out of range.
    pub fn new(settings: Settings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self { current: settings })
    }

    pub fn get(&self) -> &Settings {
        &self.current
    }

    /// Atomically replace the settings, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field; the store is
    /// not modified in that case.
    pub fn apply(&mut self, settings: Settings) -> Result<Settings, ValidationError> {
        settings.validate()?;
        Ok(std::mem::replace(&mut self.current, settings))
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self {
            current: Settings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let settings = Settings {
            study_duration_minutes: 60,
            short_break_minutes: 1,
            long_break_minutes: 60,
            long_break_interval: 10,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn each_field_is_checked() {
        let cases = [
            (
                Settings {
                    study_duration_minutes: 61,
                    ..Settings::default()
                },
                "study_duration_minutes",
            ),
            (
                Settings {
                    short_break_minutes: 31,
                    ..Settings::default()
                },
                "short_break_minutes",
            ),
            (
                Settings {
                    long_break_minutes: 0,
                    ..Settings::default()
                },
                "long_break_minutes",
            ),
            (
                Settings {
                    long_break_interval: 11,
                    ..Settings::default()
                },
                "long_break_interval",
            ),
        ];
        for (settings, field) in cases {
            assert_eq!(settings.validate().unwrap_err().field(), field);
        }
    }

    #[test]
    fn rejected_apply_keeps_previous_settings() {
        let mut store = SettingsStore::default();
        let bad = Settings {
            study_duration_minutes: 0,
            ..Settings::default()
        };
        assert!(store.apply(bad).is_err());
        assert_eq!(store.get(), &Settings::default());
    }

    #[test]
    fn apply_returns_previous_settings() {
        let mut store = SettingsStore::default();
        let next = Settings {
            study_duration_minutes: 30,
            ..Settings::default()
        };
        let previous = store.apply(next).unwrap();
        assert_eq!(previous.study_duration_minutes, 25);
        assert_eq!(store.get().study_duration_minutes, 30);
    }

    #[test]
    fn missing_toml_fields_use_defaults() {
        let settings: Settings = toml::from_str("study_duration_minutes = 50").unwrap();
        assert_eq!(settings.study_duration_minutes, 50);
        assert_eq!(settings.long_break_interval, 4);
        assert!(settings.auto_start_breaks);
        assert!(!settings.auto_start_next_work);
    }
}

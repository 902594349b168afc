//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Countdown presets, default duration and display cadence
//! - Stopwatch display cadence
//! - List view preferences
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{validate_custom_minutes, DEFAULT_MINUTES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Preset buttons, in minutes.
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_countdown_tick_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopwatchConfig {
    #[serde(default = "default_stopwatch_tick_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub show_completed_reminders: bool,
    #[serde(default = "default_true")]
    pub highlight_shortest_lap: bool,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub stopwatch: StopwatchConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_presets() -> Vec<u32> {
    vec![30, 60, 90, 120]
}
fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}
fn default_countdown_tick_ms() -> u64 {
    1000
}
fn default_stopwatch_tick_ms() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            presets: default_presets(),
            default_minutes: default_minutes(),
            tick_interval_ms: default_countdown_tick_ms(),
        }
    }
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_stopwatch_tick_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_completed_reminders: false,
            highlight_shortest_lap: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown: CountdownConfig::default(),
            stopwatch: StopwatchConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|e| invalid(e.to_string()))?
                    .into(),
            ),
            serde_json::Value::Array(_) => {
                let items = value
                    .split(',')
                    .map(|item| item.trim().parse::<u64>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| invalid(e.to_string()))?;
                serde_json::Value::from(items)
            }
            serde_json::Value::Object(_) => return Err(invalid("not a leaf key".into())),
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Reject values the engines cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        for &preset in &self.countdown.presets {
            validate_custom_minutes(u64::from(preset))
                .map_err(|e| invalid("countdown.presets", e.to_string()))?;
        }
        validate_custom_minutes(u64::from(self.countdown.default_minutes))
            .map_err(|e| invalid("countdown.default_minutes", e.to_string()))?;
        if self.countdown.tick_interval_ms == 0 {
            return Err(invalid("countdown.tick_interval_ms", "must be positive".into()));
        }
        if self.stopwatch.tick_interval_ms == 0 {
            return Err(invalid("stopwatch.tick_interval_ms", "must be positive".into()));
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving. Array values are
    /// comma-separated (`countdown.presets = "25,50"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown.tick_interval_ms)
    }

    pub fn stopwatch_tick(&self) -> Duration {
        Duration::from_millis(self.stopwatch.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[ui]\nshow_completed_reminders = true\n").unwrap();
        assert!(parsed.ui.show_completed_reminders);
        assert_eq!(parsed.countdown.presets, vec![30, 60, 90, 120]);
        assert_eq!(parsed.stopwatch.tick_interval_ms, 10);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("countdown.default_minutes").as_deref(), Some("30"));
        assert_eq!(cfg.get("ui.highlight_shortest_lap").as_deref(), Some("true"));
        assert_eq!(cfg.get("countdown.presets").as_deref(), Some("[30,60,90,120]"));
        assert!(cfg.get("ui.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_bool_number_and_list() {
        let mut cfg = Config::default();
        cfg.set("ui.show_completed_reminders", "true").unwrap();
        cfg.set("stopwatch.tick_interval_ms", "50").unwrap();
        cfg.set("countdown.presets", "25, 50").unwrap();
        assert!(cfg.ui.show_completed_reminders);
        assert_eq!(cfg.stopwatch.tick_interval_ms, 50);
        assert_eq!(cfg.countdown.presets, vec![25, 50]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("ui.nonexistent_key", "value"),
            Err(crate::error::CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(cfg.set("countdown", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("ui.show_completed_reminders", "not_a_bool").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_out_of_range_minutes() {
        let mut cfg = Config::default();
        assert!(cfg.set("countdown.default_minutes", "0").is_err());
        assert!(cfg.set("countdown.presets", "30,400000").is_err());
        assert!(cfg.set("stopwatch.tick_interval_ms", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("countdown.default_minutes", "45").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().countdown.default_minutes, 45);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "countdown = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

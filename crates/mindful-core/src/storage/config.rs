//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The breathing pattern and offered breathing session lengths
//! - Focus timer presets
//! - How often hosts should tick the timer
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{
    PhaseSpec, BREATHING_DURATION_OPTIONS_MIN, DEFAULT_BREATHING_MIN, DEFAULT_FOCUS_MIN,
    FOCUS_PRESETS_MIN,
};

/// Breathing-session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_breathing_minutes")]
    pub default_minutes: u64,
    #[serde(default = "default_duration_options")]
    pub duration_options: Vec<u64>,
    /// Phase sequence cycled through during a breathing session.
    #[serde(default)]
    pub pattern: PhaseSpec,
}

/// Focus-timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_focus_minutes")]
    pub default_minutes: u64,
    #[serde(default = "default_focus_presets")]
    pub presets: Vec<u64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Interval between host ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub focus: FocusConfig,
}

fn default_breathing_minutes() -> u64 {
    DEFAULT_BREATHING_MIN
}
fn default_duration_options() -> Vec<u64> {
    BREATHING_DURATION_OPTIONS_MIN.to_vec()
}
fn default_focus_minutes() -> u64 {
    DEFAULT_FOCUS_MIN
}
fn default_focus_presets() -> Vec<u64> {
    FOCUS_PRESETS_MIN.to_vec()
}
fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_breathing_minutes(),
            duration_options: default_duration_options(),
            pattern: PhaseSpec::box_breathing(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_focus_minutes(),
            presets: default_focus_presets(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            breathing: BreathingConfig::default(),
            focus: FocusConfig::default(),
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

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
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

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => return Err(invalid("not a settable value".into())),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Reject values that deserialize fine but make no sense.
    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_interval_ms", self.tick_interval_ms),
            ("breathing.default_minutes", self.breathing.default_minutes),
            ("focus.default_minutes", self.focus.default_minutes),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be positive".into(),
                });
            }
        }
        for (key, options) in [
            ("breathing.duration_options", &self.breathing.duration_options),
            ("focus.presets", &self.focus.presets),
        ] {
            if options.contains(&0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "durations must be positive".into(),
                });
            }
        }
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// Arrays and tables (such as `breathing.pattern`) take JSON. The config
    /// is left unchanged if the key is unknown or the result is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or validated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All leaf keys with their current values, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        match serde_json::to_value(self) {
            Ok(json) => walk("", &json, &mut out),
            Err(e) => warn!(error = %e, "config could not be flattened"),
        }
        out
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
        assert_eq!(parsed.breathing.pattern, PhaseSpec::box_breathing());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_interval_ms, 1000);
        assert_eq!(cfg.breathing.default_minutes, 2);
        assert_eq!(cfg.breathing.duration_options, vec![1, 2, 5, 10]);
        assert_eq!(cfg.focus.default_minutes, 25);
        assert_eq!(cfg.focus.presets, vec![5, 15, 25, 45, 60]);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("focus.default_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("tick_interval_ms").as_deref(), Some("1000"));
        assert!(cfg.get("focus.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("breathing.default_minutes", "5").unwrap();
        assert_eq!(cfg.breathing.default_minutes, 5);
    }

    #[test]
    fn set_replaces_pattern_from_json() {
        let mut cfg = Config::default();
        cfg.set(
            "breathing.pattern",
            r#"[{"name":"inhale","duration_secs":4},{"name":"hold","duration_secs":7},{"name":"exhale","duration_secs":8}]"#,
        )
        .unwrap();
        assert_eq!(cfg.breathing.pattern.cycle_secs(), 19);
    }

    #[test]
    fn set_rejects_invalid_pattern() {
        let mut cfg = Config::default();
        let result = cfg.set(
            "breathing.pattern",
            r#"[{"name":"inhale","duration_secs":0}]"#,
        );
        assert!(result.is_err());
        assert_eq!(cfg.breathing.pattern, PhaseSpec::box_breathing());
        assert!(cfg.set("breathing.pattern", "[]").is_err());
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("focus.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type_and_zero() {
        let mut cfg = Config::default();
        assert!(cfg.set("focus.default_minutes", "soon").is_err());
        assert!(cfg.set("focus.default_minutes", "0").is_err());
        assert!(cfg.set("tick_interval_ms", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_by_path_rejects_non_numeric_non_structured_leaves() {
        let mut root = serde_json::json!({ "flag": true, "name": "inhale" });
        for key in ["flag", "name"] {
            assert!(matches!(
                Config::set_json_value_by_path(&mut root, key, "true"),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
        assert_eq!(root["flag"], true);
        assert_eq!(root["name"], "inhale");
    }

    #[test]
    fn entries_lists_leaf_keys() {
        let entries = Config::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"tick_interval_ms"));
        assert!(keys.contains(&"focus.presets"));
        assert!(keys.contains(&"breathing.pattern"));
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut edited = cfg.clone();
        edited.set("focus.default_minutes", "45").unwrap();
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().focus.default_minutes, 45);
    }

    #[test]
    fn load_from_rejects_invalid_pattern_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[breathing.pattern]]\nname = \"inhale\"\nduration_secs = 0\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}

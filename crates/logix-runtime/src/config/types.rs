//! Configuration types.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
///
/// Every section is `#[serde(default)]`, so a config file only lists the
/// values it changes.
///
/// # Example
///
/// ```
/// use logix_runtime::config::EngineConfig;
///
/// let config = EngineConfig::from_toml("[execution]\nslow_threshold_ms = 40").expect("valid toml");
/// assert!(!config.debug);
/// assert_eq!(config.execution.slow_threshold_ms, 40);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Enables debug-level logging regardless of `logging.level`.
    pub debug: bool,

    pub execution: ExecutionConfig,

    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// # Errors
    ///
    /// Returns error if the input is not valid TOML for this shape.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Overlays `other` onto `self`.
    ///
    /// Only values in `other` that differ from the defaults are taken, so a
    /// later layer that leaves a field unset never resets an earlier one.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.execution.merge(&other.execution);
        self.logging.merge(&other.logging);
    }

    /// The filter directive the logging layer starts from.
    #[must_use]
    pub fn log_directive(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.logging.level
        }
    }
}

/// Execution monitoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Passes slower than this emit a `warn` event.
    pub slow_threshold_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: 250,
        }
    }
}

impl ExecutionConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.slow_threshold_ms != default.slow_threshold_ms {
            self.slow_threshold_ms = other.slow_threshold_ms;
        }
    }
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"logix_component=debug"`.
    pub level: String,

    /// ANSI colors in the fmt layer.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.level != default.level {
            self.level = other.level.clone();
        }
        if other.ansi != default.ansi {
            self.ansi = other.ansi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert!(!config.debug);
        assert_eq!(config.execution.slow_threshold_ms, 250);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.ansi);
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = EngineConfig::default();
        config.debug = true;
        config.logging.level = "logix_component=trace".into();

        let text = config.to_toml().expect("serialize");
        let back = EngineConfig::from_toml(&text).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            EngineConfig::from_toml("").expect("parse"),
            EngineConfig::default()
        );
    }

    #[test]
    fn merge_keeps_earlier_values_when_later_is_default() {
        let mut base = EngineConfig::default();
        base.execution.slow_threshold_ms = 10;
        base.logging.ansi = false;

        let mut overlay = EngineConfig::default();
        overlay.logging.level = "warn".into();

        base.merge(&overlay);
        assert_eq!(base.execution.slow_threshold_ms, 10);
        assert!(!base.logging.ansi);
        assert_eq!(base.logging.level, "warn");
    }

    #[test]
    fn debug_forces_debug_directive() {
        let mut config = EngineConfig::default();
        assert_eq!(config.log_directive(), "info");
        config.debug = true;
        assert_eq!(config.log_directive(), "debug");
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        assert!(EngineConfig::from_toml("[execution]\nslow_threshold_ms = \"fast\"").is_err());
    }
}

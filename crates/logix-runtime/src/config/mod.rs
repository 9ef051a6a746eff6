//! Configuration management with hierarchical layering.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Environment Variables (LOGIX_*)      │  Runtime override
//! ├──────────────────────────────────────────┤
//! │  2. Project Config (.logix/config.toml)  │  Site-specific
//! ├──────────────────────────────────────────┤
//! │  3. Global Config (~/.logix/config.toml) │  User defaults
//! ├──────────────────────────────────────────┤
//! │  4. Default Values (compile-time)        │  Fallback
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `LOGIX_DEBUG` | `debug` | bool |
//! | `LOGIX_LOG_LEVEL` | `logging.level` | String |
//! | `LOGIX_LOG_ANSI` | `logging.ansi` | bool |
//! | `LOGIX_SLOW_THRESHOLD_MS` | `execution.slow_threshold_ms` | u64 |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.logix/config.toml
//! debug = false
//!
//! [execution]
//! slow_threshold_ms = 250
//!
//! [logging]
//! level = "info"
//! ansi = true
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{save_config, save_global_config, ConfigLoader};
pub use types::{EngineConfig, ExecutionConfig, LoggingConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".logix")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join(PROJECT_CONFIG_FILE)
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".logix";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";

//! Configuration errors.

use logix_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving an [`EngineConfig`](super::EngineConfig).
///
/// Codes use the `CONFIG_` prefix. A malformed file or environment value is
/// recoverable: the caller can fix it and reload. I/O failures are not.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A global or project config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not match the schema.
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// `save_config` could not render the config as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `save_config` could not write the target file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `LOGIX_*` override is set but cannot be parsed, such as
    /// `LOGIX_DEBUG=sometimes` or a negative `LOGIX_SLOW_THRESHOLD_MS`.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// `save_config` could not create the parent directory.
    #[error("failed to create config directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Wraps a read failure for `path`.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Wraps a TOML decode failure for `path`.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    /// Wraps a write failure for `path`.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Rejects the value of environment variable `name`.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wraps a directory creation failure for `path`.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseToml { .. } => "CONFIG_PARSE_TOML",
            Self::Serialize(_) => "CONFIG_SERIALIZE",
            Self::WriteFile { .. } => "CONFIG_WRITE_FILE",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::CreateDir { .. } => "CONFIG_CREATE_DIR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::ParseToml { .. } | Self::InvalidEnvVar { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_types::assert_error_codes;

    fn io() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "gone")
    }

    #[test]
    fn error_display() {
        let err = ConfigError::invalid_env_var("LOGIX_DEBUG", "expected bool");
        assert!(err.to_string().contains("LOGIX_DEBUG"));
        assert!(err.to_string().contains("expected bool"));
    }

    #[test]
    fn file_errors_keep_path_and_source() {
        use std::error::Error as _;

        let err = ConfigError::read_file("/etc/logix/config.toml", io());
        assert!(err.to_string().contains("/etc/logix/config.toml"));
        assert!(err.source().is_some());
        assert!(!err.is_recoverable());

        let parse = toml::from_str::<toml::Value>("= broken").expect_err("invalid toml");
        let err = ConfigError::parse_toml(".logix/config.toml", parse);
        assert!(err.is_recoverable());
        assert!(err.source().is_some());
    }

    #[test]
    fn codes_carry_prefix() {
        let parse = toml::from_str::<toml::Value>("= broken").expect_err("invalid toml");
        assert_error_codes(
            &[
                ConfigError::read_file("a.toml", io()),
                ConfigError::parse_toml("a.toml", parse),
                ConfigError::write_file("a.toml", io()),
                ConfigError::invalid_env_var("LOGIX_DEBUG", "expected bool"),
                ConfigError::create_dir("/tmp/x", io()),
            ],
            "CONFIG_",
        );
    }
}

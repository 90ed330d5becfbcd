//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking a [`HermesConfig`](crate::HermesConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("cannot read {path}")]
    ReadError {
        /// The unreadable file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed or unknown keys in a TOML document.
    #[error("bad TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed or unknown keys in a JSON document.
    #[error("bad JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Neither TOML nor JSON.
    #[error("unsupported configuration format '{format}'")]
    UnsupportedFormat {
        /// The extension or format name given.
        format: String,
    },

    /// A `.env` file could not be applied.
    #[error("cannot load {path}: {message}")]
    Dotenv {
        /// The `.env` file.
        path: PathBuf,
        /// The loader's complaint.
        message: String,
    },

    /// An environment override could not be parsed.
    #[error("environment override {var}: {reason}")]
    EnvParseError {
        /// The variable, e.g. `HERMES__LOGGING__ENABLED`.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A configured validation pattern does not compile.
    #[error("validation pattern '{name}' does not compile")]
    InvalidPattern {
        /// The pattern name.
        name: String,
        /// The regex compiler's error.
        #[source]
        source: regex::Error,
    },

    /// A value is out of its allowed range.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path of the setting, e.g. `dispatch.command_kind`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// A missing file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// An unreadable file.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// A format other than TOML or JSON.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// A `.env` failure.
    pub fn dotenv(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Dotenv {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A bad environment override.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// A pattern that does not compile.
    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }

    /// An out-of-range setting.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = ConfigError::file_not_found("/etc/hermes/hermes.toml");
        assert!(err.to_string().contains("/etc/hermes/hermes.toml"));
    }

    #[test]
    fn test_invalid_value_names_field() {
        let err = ConfigError::invalid_value("dispatch.command_kind", "must not be empty");
        assert_eq!(err.to_string(), "dispatch.command_kind: must not be empty");
    }

    #[test]
    fn test_env_parse_error_names_variable() {
        let err = ConfigError::env_parse_error("HERMES__LOGGING__ENABLED", "expected boolean");
        assert!(err.to_string().contains("HERMES__LOGGING__ENABLED"));
        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("([").unwrap_err();
        let err = ConfigError::invalid_pattern("zip", source);
        assert!(err.to_string().contains("'zip'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigError::unsupported_format("yaml");
        assert_eq!(err.to_string(), "unsupported configuration format 'yaml'");
    }
}

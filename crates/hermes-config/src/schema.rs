//! Configuration schema definitions.
//!
//! This module defines the structure of all configuration sections.

use hermes_telemetry::LogConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Application identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name, used in log output.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Deployment environment (development, staging, production).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_environment(),
        }
    }
}

fn default_app_name() -> String {
    "hermes-app".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (`info`, `hermes=debug,warn`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open/close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Include the module path in logs.
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Converts into the subscriber settings used by `hermes-telemetry`.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: self.span_events,
            file_line_info: self.include_location,
            include_target: self.include_target,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        config.to_log_config()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Middleware names prepended to every route, in order.
    #[serde(default)]
    pub global_middleware: Vec<String>,

    /// Request kind under which console commands are registered.
    #[serde(default = "default_command_kind")]
    pub command_kind: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            global_middleware: Vec::new(),
            command_kind: default_command_kind(),
        }
    }
}

fn default_command_kind() -> String {
    "console".to_string()
}

/// A named pattern for `regex:<name>` rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    /// The regular expression.
    pub regex: String,

    /// Message template used when the pattern does not match.
    #[serde(default)]
    pub message: Option<String>,
}

/// Validation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Extra global named patterns.
    #[serde(default)]
    pub patterns: IndexMap<String, PatternConfig>,

    /// Global message overrides keyed by operation (`min`, `!same`).
    #[serde(default)]
    pub messages: IndexMap<String, String>,
}

fn default_true() -> bool {
    true
}

//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{AppConfig, ConfigError, DispatchConfig, LogFormat, LoggingConfig, ValidationConfig};

/// Complete Hermes application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.dispatch.command_kind, "console");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Application identity.
    #[serde(default)]
    pub app: AppConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dispatch configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Validation engine configuration.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl HermesConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for a validation pattern that
    /// does not compile, and `ConfigError::InvalidValue` if:
    /// - The application name is empty
    /// - The log level is not a valid filter directive
    /// - The command kind is empty or contains whitespace
    /// - A global middleware name is empty or repeated
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("app.name", "must not be empty"));
        }

        if self.logging.enabled {
            hermes_telemetry::logging::create_env_filter(&self.logging.level).map_err(|e| {
                ConfigError::invalid_value("logging.level", e.to_string())
            })?;
        }

        let kind = &self.dispatch.command_kind;
        if kind.is_empty() || kind.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_value(
                "dispatch.command_kind",
                format!("invalid command kind: {kind:?}"),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.dispatch.global_middleware {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "dispatch.global_middleware",
                    "middleware names must not be empty",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::invalid_value(
                    "dispatch.global_middleware",
                    format!("duplicate middleware: {name}"),
                ));
            }
        }

        for (name, pattern) in &self.validation.patterns {
            Regex::new(&pattern.regex).map_err(|e| ConfigError::invalid_pattern(name, e))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting
    /// - Debug log level with span events and source locations
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;

        config.app.environment = "development".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.span_events = false;
        config.logging.include_location = false;

        config.app.environment = "production".to_string();

        config
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    app: Option<AppConfig>,
    logging: Option<LoggingConfig>,
    dispatch: Option<DispatchConfig>,
    validation: Option<ValidationConfig>,
}

impl HermesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application section.
    #[must_use]
    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = Some(app);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the dispatch section.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the validation section.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        HermesConfig {
            app: self.app.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            dispatch: self.dispatch.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

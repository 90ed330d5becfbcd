//! Boot and shutdown errors.

use hermes_config::ConfigError;
use hermes_router::PatternError;
use hermes_validation::ValidationError;
use thiserror::Error;

/// Errors raised while building or tearing down an [`Application`](crate::Application).
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// A route pattern did not compile.
    #[error("Invalid route '{pattern}': {source}")]
    Route {
        /// The pattern source.
        pattern: String,
        /// Why it was rejected.
        #[source]
        source: PatternError,
    },

    /// A validation pattern or operation could not be installed.
    #[error("Validation setup failed: {0}")]
    Validation(#[from] ValidationError),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telemetry could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hermes_telemetry::TelemetryError),

    /// A shutdown hook failed.
    #[error("Shutdown hook '{name}' failed: {source}")]
    ShutdownFailed {
        /// The hook name.
        name: String,
        /// The hook's error.
        #[source]
        source: anyhow::Error,
    },
}

impl ApplicationError {
    /// Creates a route error.
    pub fn route(pattern: impl Into<String>, source: PatternError) -> Self {
        Self::Route {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result type for boot and shutdown.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

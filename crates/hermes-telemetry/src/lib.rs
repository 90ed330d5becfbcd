//! Observability for Hermes.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Metrics**: dispatch and validation counters via the `metrics` facade
//!
//! # Example
//!
//! ```rust,no_run
//! use hermes_telemetry::{init_telemetry, logging::LogConfig};
//!
//! init_telemetry(&LogConfig::production()).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{record_dispatch, record_validation_failure, DispatchOutcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging and registers metric descriptions.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized.
pub fn init_telemetry(log: &LogConfig) -> TelemetryResult<()> {
    logging::init_logging(log)?;
    crate::metrics::describe_metrics();
    tracing::info!(level = %log.level, json = log.json_format, "telemetry initialized");
    Ok(())
}

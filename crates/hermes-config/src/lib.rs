//! Typed configuration for Hermes applications.
//!
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Layered configuration (defaults → file → `.env` → env)
//!
//! The root type is [`HermesConfig`]:
//!
//! - [`AppConfig`] - application name and environment
//! - [`LoggingConfig`] - log level and format, converted into
//!   [`hermes_telemetry::LogConfig`]
//! - [`DispatchConfig`] - global middleware and the console command kind
//! - [`ValidationConfig`] - extra named patterns and message overrides
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::{ConfigLoader, ENV_PREFIX};
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix(ENV_PREFIX)
//!     .load()?;
//!
//! println!("global middleware: {:?}", config.dispatch.global_middleware);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! name = "blog"
//! environment = "production"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [dispatch]
//! global_middleware = ["trim"]
//! command_kind = "console"
//!
//! [validation.patterns.zip]
//! regex = "^[0-9]{5}$"
//! message = ":attribute must be a zip code"
//!
//! [validation.messages]
//! required = ":attribute is mandatory"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__LOGGING__LEVEL=debug`
//! - `HERMES__DISPATCH__GLOBAL_MIDDLEWARE=trim,auth`
//! - `HERMES__VALIDATION__MESSAGES__REQUIRED=":attribute is needed"`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HermesConfig, HermesConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::{
    AppConfig, DispatchConfig, LogFormat, LoggingConfig, PatternConfig, ValidationConfig,
};

//! Error types for rule set construction.
//!
//! Failures while *evaluating* rules are [`DispatchError`](hermes_core::DispatchError)s
//! so they flow through the dispatcher unchanged. The errors here are raised
//! while building a validator or a rule set, before any request runs.

use thiserror::Error;

/// Result type for validation setup.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while configuring validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A named pattern did not compile.
    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        /// The pattern name.
        name: String,
        /// The regex compiler error.
        #[source]
        source: regex::Error,
    },

    /// An operation was registered without a name.
    #[error("Operation name must not be empty")]
    EmptyOperationName,
}

impl ValidationError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }
}

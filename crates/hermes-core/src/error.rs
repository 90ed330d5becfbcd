//! Error types for Hermes dispatch.
//!
//! [`DispatchError`] is the error type shared by the binder, the middleware
//! pipeline, the validation engine and the dispatcher. Every variant belongs
//! to an [`ErrorCategory`], which decides the HTTP status code and whether
//! the dispatcher turns the error into a response or propagates it.
//!
//! | Variant | Category | Status |
//! |---|---|---|
//! | `RouteNotFound` | `NotFound` | 404 |
//! | `EntityNotFound` | `NotFound` | 404 |
//! | `MissingArgument` | `Usage` | 400 |
//! | `InvalidArgument` | `Usage` | 400 |
//! | `Usage` | `Usage` | 400 |
//! | `HandlerResolution` | `Resolution` | 500 |
//! | `UnknownValidationRule` | `Programming` | 500 |
//! | `Middleware` | `Internal` | 500 |
//! | `Handler` | `Internal` | 500 |
//! | `Persistence` | `Internal` | 500 |

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::{json_response, Response};

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of dispatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No route or no entity for the request.
    NotFound,
    /// The request does not fit the handler's invocation shape.
    Usage,
    /// A route points at a controller, action or middleware that does not exist.
    Resolution,
    /// A mistake in application code, such as an unknown validation rule.
    Programming,
    /// A fault raised by a middleware, a handler or the persistence layer.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Usage => StatusCode::BAD_REQUEST,
            Self::Resolution | Self::Programming | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Failure reported by a [`Persistence`](crate::Persistence) collaborator.
#[derive(Error, Debug)]
#[error("Persistence error on '{entity}': {message}")]
pub struct PersistenceError {
    /// The entity type being looked up.
    pub entity: String,
    /// Human-readable error message.
    pub message: String,
    /// The underlying store error.
    #[source]
    pub source: Option<anyhow::Error>,
}

impl PersistenceError {
    /// Creates a persistence error without an underlying cause.
    #[must_use]
    pub fn new(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a persistence error wrapping the store's own error.
    pub fn with_source(
        entity: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            entity: entity.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Standard error type for Hermes dispatch.
///
/// # Example
///
/// ```
/// use hermes_core::{DispatchError, ErrorCategory};
///
/// let err = DispatchError::missing_argument("user", "GET /users/{user}");
/// assert_eq!(err.category(), ErrorCategory::Usage);
/// assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No route matched the request.
    #[error("No route for {kind} '{path}'")]
    RouteNotFound {
        /// The request kind, e.g. `GET` or `command:console`.
        kind: String,
        /// The path or command line that was looked up.
        path: String,
    },

    /// The matched route references something that is not registered.
    #[error("Cannot resolve handler '{handler}': {reason}")]
    HandlerResolution {
        /// The controller/action or middleware name.
        handler: String,
        /// What was missing.
        reason: String,
    },

    /// A handler parameter had no value and no default.
    #[error("Missing argument '{parameter}', usage: {usage}")]
    MissingArgument {
        /// The parameter name.
        parameter: String,
        /// The expected invocation shape.
        usage: String,
    },

    /// A bound argument could not be read as the type the handler asked for.
    #[error("Invalid argument '{parameter}': {message}")]
    InvalidArgument {
        /// The parameter name.
        parameter: String,
        /// Why the conversion failed.
        message: String,
    },

    /// Model binding found no entity for the key.
    #[error("No {entity} found for key '{key}'")]
    EntityNotFound {
        /// The entity type.
        entity: String,
        /// The key that was looked up.
        key: String,
    },

    /// A rule set named an operation the engine does not know.
    #[error("Unknown validation rule '{rule}' for field '{field}'")]
    UnknownValidationRule {
        /// The field carrying the rule.
        field: String,
        /// The rule token as written.
        rule: String,
    },

    /// A command was invoked with the wrong number of arguments.
    #[error("{message}")]
    Usage {
        /// Usage text for the caller.
        message: String,
    },

    /// A middleware stage failed.
    #[error("Middleware '{stage}' failed: {message}")]
    Middleware {
        /// The stage name.
        stage: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A handler failed.
    #[error("Handler error: {message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The persistence collaborator failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl DispatchError {
    /// Creates a route-not-found error.
    #[must_use]
    pub fn route_not_found(kind: impl ToString, path: impl Into<String>) -> Self {
        Self::RouteNotFound {
            kind: kind.to_string(),
            path: path.into(),
        }
    }

    /// Creates a handler resolution error.
    #[must_use]
    pub fn handler_resolution(handler: impl ToString, reason: impl Into<String>) -> Self {
        Self::HandlerResolution {
            handler: handler.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a missing argument error.
    #[must_use]
    pub fn missing_argument(parameter: impl Into<String>, usage: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
            usage: usage.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Creates an entity-not-found error.
    #[must_use]
    pub fn entity_not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Creates an unknown validation rule error.
    #[must_use]
    pub fn unknown_rule(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::UnknownValidationRule {
            field: field.into(),
            rule: rule.into(),
        }
    }

    /// Creates a command usage error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a middleware error.
    #[must_use]
    pub fn middleware(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Middleware {
            stage: stage.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error with a source error.
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::RouteNotFound { .. } | Self::EntityNotFound { .. } => ErrorCategory::NotFound,
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } | Self::Usage { .. } => {
                ErrorCategory::Usage
            }
            Self::HandlerResolution { .. } => ErrorCategory::Resolution,
            Self::UnknownValidationRule { .. } => ErrorCategory::Programming,
            Self::Middleware { .. } | Self::Handler { .. } | Self::Persistence(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// True when the dispatcher answers this error with a response instead
    /// of returning it to the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::NotFound | ErrorCategory::Usage | ErrorCategory::Resolution
        )
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::HandlerResolution { .. } => "HANDLER_RESOLUTION",
            Self::MissingArgument { .. } => "MISSING_ARGUMENT",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            Self::UnknownValidationRule { .. } => "UNKNOWN_VALIDATION_RULE",
            Self::Usage { .. } => "USAGE",
            Self::Middleware { .. } => "MIDDLEWARE_ERROR",
            Self::Handler { .. } => "HANDLER_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        }
    }

    /// Renders the normalized JSON error response.
    #[must_use]
    pub fn to_response(&self) -> Response {
        let body = serde_json::to_vec(&self.to_envelope()).map_or_else(
            |_| Bytes::from_static(br#"{"error":{"code":"INTERNAL_ERROR","message":""}}"#),
            Bytes::from,
        );
        json_response(self.status_code(), body)
    }
}

/// Serializable error envelope for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error details within the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found() {
        let err = DispatchError::route_not_found("GET", "/nope");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "No route for GET '/nope'");
    }

    #[test]
    fn test_missing_argument_names_parameter() {
        let err = DispatchError::missing_argument("user", "GET /users/{user}");
        assert!(err.to_string().contains("'user'"));
        assert!(err.to_string().contains("GET /users/{user}"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unknown_rule_propagates() {
        let err = DispatchError::unknown_rule("email", "emial");
        assert_eq!(err.category(), ErrorCategory::Programming);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_handler_fault_is_not_recoverable() {
        let err = DispatchError::handler_with_source("boom", anyhow::anyhow!("inner"));
        assert!(!err.is_recoverable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_persistence_converts() {
        let err: DispatchError = PersistenceError::new("user", "connection refused").into();
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_envelope_serialization() {
        let err = DispatchError::entity_not_found("user", "42");
        let json = serde_json::to_value(err.to_envelope()).unwrap();
        assert_eq!(json["error"]["code"], "ENTITY_NOT_FOUND");
        assert_eq!(json["error"]["message"], "No user found for key '42'");
    }

    #[test]
    fn test_to_response() {
        let response = DispatchError::usage("needs 2 arguments").to_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"]["code"], "USAGE");
    }

    #[test]
    fn test_all_categories_have_status_codes() {
        for (category, status) in [
            (ErrorCategory::NotFound, 404),
            (ErrorCategory::Usage, 400),
            (ErrorCategory::Resolution, 500),
            (ErrorCategory::Programming, 500),
            (ErrorCategory::Internal, 500),
        ] {
            assert_eq!(category.default_status_code().as_u16(), status);
        }
    }
}

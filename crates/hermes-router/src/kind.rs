//! Request kinds.
//!
//! Routes are grouped by the kind of request they answer: an HTTP method for
//! web requests, or a named command type for console invocations. The kind
//! also decides how patterns and inputs are split into tokens.

use std::fmt;

use http::Method;

/// The default command type used for console dispatch.
pub const DEFAULT_COMMAND_KIND: &str = "console";

/// The kind of request a route answers.
///
/// # Example
///
/// ```rust
/// use hermes_router::RequestKind;
/// use http::Method;
///
/// let get = RequestKind::http(Method::GET);
/// assert_eq!(get.tokenize("/users/42/"), vec!["users", "42"]);
///
/// let console = RequestKind::console();
/// assert_eq!(console.tokenize("make:migration  users"), vec!["make:migration", "users"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A web request for the given HTTP method.
    Http(Method),
    /// A console command of the given type.
    Command(String),
}

impl RequestKind {
    /// Creates a web request kind.
    #[must_use]
    pub fn http(method: Method) -> Self {
        Self::Http(method)
    }

    /// Creates a command request kind.
    #[must_use]
    pub fn command(kind: impl Into<String>) -> Self {
        Self::Command(kind.into())
    }

    /// The default console command kind.
    #[must_use]
    pub fn console() -> Self {
        Self::Command(DEFAULT_COMMAND_KIND.to_string())
    }

    /// Returns true for command kinds.
    #[must_use]
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command(_))
    }

    /// Splits a pattern or an input line into tokens for this kind.
    ///
    /// Web paths split on `/` with empty segments dropped, so trailing and
    /// doubled slashes are normalized. Commands split on ASCII whitespace.
    #[must_use]
    pub fn tokenize<'a>(&self, input: &'a str) -> Vec<&'a str> {
        match self {
            Self::Http(_) => split_path(input),
            Self::Command(_) => split_command(input),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(method) => write!(f, "{method}"),
            Self::Command(kind) => write!(f, "command:{kind}"),
        }
    }
}

impl From<Method> for RequestKind {
    fn from(method: Method) -> Self {
        Self::Http(method)
    }
}

/// Splits a request path into segments, ignoring any query string.
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Splits a command line into whitespace-separated tokens.
#[must_use]
pub fn split_command(line: &str) -> Vec<&str> {
    line.split_ascii_whitespace().collect()
}

//! Request context types.
//!
//! The [`RequestContext`] carries all per-request state through the middleware
//! pipeline, the binder and into handlers. It is created once per dispatched
//! request and dropped when the response is produced.

use std::collections::HashMap;
use std::time::Instant;

use hermes_router::{Captures, HandlerRef, RequestKind};
use http::HeaderMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::BindingCache;
use crate::outcome::ValidationOutcome;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Metadata of the matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// The pattern as registered.
    pub pattern: String,
    /// The controller/action the route points at.
    pub handler: HandlerRef,
}

/// Per-request state shared by middleware, binder, validation and handler.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_router::RequestKind;
/// use serde_json::json;
///
/// let mut ctx = RequestContext::new(RequestKind::http(http::Method::POST), "/users")
///     .with_input([("email".to_string(), json!("ada@example.com"))]);
///
/// ctx.set_attribute("tenant", json!("acme"));
/// assert_eq!(ctx.input_value("email"), Some(&json!("ada@example.com")));
/// assert_eq!(ctx.attribute("tenant"), Some(&json!("acme")));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    kind: RequestKind,
    path: String,
    route: Option<RouteInfo>,
    captures: Captures,
    options: IndexMap<String, Value>,
    input: IndexMap<String, Value>,
    headers: HeaderMap,
    attributes: HashMap<String, Value>,
    bindings: BindingCache,
    validation: Option<ValidationOutcome>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request of `kind` addressed to `path` (a URL
    /// path or a command line).
    #[must_use]
    pub fn new(kind: RequestKind, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            kind,
            path: path.into(),
            route: None,
            captures: Captures::new(),
            options: IndexMap::new(),
            input: IndexMap::new(),
            headers: HeaderMap::new(),
            attributes: HashMap::new(),
            bindings: BindingCache::new(),
            validation: None,
            started_at: Instant::now(),
        }
    }

    /// Creates a mock web context for testing purposes.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(RequestKind::http(http::Method::GET), "/")
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request kind.
    #[must_use]
    pub const fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Returns the raw path or command line.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the matched route, once routing has happened.
    #[must_use]
    pub const fn route(&self) -> Option<&RouteInfo> {
        self.route.as_ref()
    }

    /// Sets the matched route.
    pub fn set_route(&mut self, pattern: impl Into<String>, handler: HandlerRef) {
        self.route = Some(RouteInfo {
            pattern: pattern.into(),
            handler,
        });
    }

    /// Returns a new context with the matched route set.
    #[must_use]
    pub fn with_route(mut self, pattern: impl Into<String>, handler: HandlerRef) -> Self {
        self.set_route(pattern, handler);
        self
    }

    /// Returns the captured route variables.
    #[must_use]
    pub const fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Returns one captured variable.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name)
    }

    /// Sets or replaces one captured variable.
    pub fn set_capture(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captures.push(name, value);
    }

    /// Returns a new context with the specified captures.
    #[must_use]
    pub fn with_captures(mut self, captures: Captures) -> Self {
        self.captures = captures;
        self
    }

    /// Returns the CLI options bag.
    #[must_use]
    pub const fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    /// Returns one CLI option.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Returns a new context with the specified CLI options.
    #[must_use]
    pub fn with_options(mut self, options: IndexMap<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Returns the input batch.
    #[must_use]
    pub const fn input(&self) -> &IndexMap<String, Value> {
        &self.input
    }

    /// Returns one input field.
    #[must_use]
    pub fn input_value(&self, field: &str) -> Option<&Value> {
        self.input.get(field)
    }

    /// Sets or replaces one input field.
    pub fn set_input(&mut self, field: impl Into<String>, value: Value) {
        self.input.insert(field.into(), value);
    }

    /// Returns a new context with the specified input batch.
    #[must_use]
    pub fn with_input(mut self, input: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.input = input.into_iter().collect();
        self
    }

    /// Returns the request headers. Empty for commands.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a new context with the specified headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns a free-form attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets a free-form attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(name.into(), value)
    }

    /// Returns the entity binding cache.
    #[must_use]
    pub const fn bindings(&self) -> &BindingCache {
        &self.bindings
    }

    /// Returns the entity binding cache for writing.
    pub fn bindings_mut(&mut self) -> &mut BindingCache {
        &mut self.bindings
    }

    /// Returns the input batch together with a writable binding cache.
    pub fn input_and_bindings_mut(&mut self) -> (&IndexMap<String, Value>, &mut BindingCache) {
        (&self.input, &mut self.bindings)
    }

    /// Returns the stored validation outcome, if input was validated.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationOutcome> {
        self.validation.as_ref()
    }

    /// Stores a validation outcome.
    pub fn set_validation(&mut self, outcome: ValidationOutcome) {
        self.validation = Some(outcome);
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::mock()
    }
}

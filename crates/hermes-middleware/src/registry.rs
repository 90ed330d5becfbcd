//! Named middleware, resolved into pipelines per route.

use std::fmt;
use std::sync::Arc;

use hermes_core::DispatchError;
use indexmap::IndexMap;

use crate::middleware::{BoxedMiddleware, Middleware};
use crate::pipeline::Pipeline;

/// Middleware registered under the names routes refer to.
///
/// Built during boot, read-only afterwards.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_middleware::{FnMiddleware, MiddlewareRegistry};
///
/// let mut registry = MiddlewareRegistry::new();
/// registry.register(FnMiddleware::new("auth", |ctx: RequestContext| Ok(ctx)));
///
/// let pipeline = registry.resolve(&["auth".to_string()]).unwrap();
/// assert_eq!(pipeline.stage_names(), vec!["auth"]);
/// assert!(registry.resolve(&["missing".to_string()]).is_err());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: IndexMap<String, BoxedMiddleware>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a middleware under its own name, replacing any earlier one.
    pub fn register(&mut self, middleware: impl Middleware) {
        self.register_shared(Arc::new(middleware));
    }

    /// Registers a shared middleware under its own name.
    pub fn register_shared(&mut self, middleware: BoxedMiddleware) {
        self.entries.insert(middleware.name().to_string(), middleware);
    }

    /// Registers a middleware under an alias.
    pub fn register_as(&mut self, name: impl Into<String>, middleware: BoxedMiddleware) {
        self.entries.insert(name.into(), middleware);
    }

    /// Returns the middleware registered as `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedMiddleware> {
        self.entries.get(name)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Builds the pipeline for a route's (already merged) middleware list.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerResolution`] naming the first
    /// unregistered middleware.
    pub fn resolve(&self, names: &[String]) -> Result<Pipeline, DispatchError> {
        let stages = names
            .iter()
            .map(|name| {
                self.entries.get(name).cloned().ok_or_else(|| {
                    DispatchError::handler_resolution(name, "middleware not registered")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pipeline::from_stages(stages))
    }

    /// Number of registered middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnMiddleware;
    use hermes_core::RequestContext;

    fn passthrough(name: &str) -> impl Middleware {
        FnMiddleware::new(name, |ctx: RequestContext| Ok(ctx))
    }

    #[test]
    fn test_resolve_keeps_route_order() {
        let mut registry = MiddlewareRegistry::new();
        registry.register(passthrough("auth"));
        registry.register(passthrough("log"));

        let pipeline = registry
            .resolve(&["log".to_string(), "auth".to_string()])
            .unwrap();
        assert_eq!(pipeline.stage_names(), vec!["log", "auth"]);
    }

    #[test]
    fn test_unknown_middleware_is_resolution_error() {
        let registry = MiddlewareRegistry::new();
        let err = registry.resolve(&["throttle".to_string()]).unwrap_err();
        match err {
            DispatchError::HandlerResolution { handler, reason } => {
                assert_eq!(handler, "throttle");
                assert_eq!(reason, "middleware not registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_register_as_alias() {
        let mut registry = MiddlewareRegistry::new();
        registry.register_as("guest", Arc::new(passthrough("auth")));
        assert!(registry.contains("guest"));
        assert!(!registry.contains("auth"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = MiddlewareRegistry::new();
        registry.register(passthrough("auth"));
        registry.register(passthrough("auth"));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(&[]).unwrap().is_empty());
    }
}

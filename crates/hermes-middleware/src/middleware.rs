//! Core middleware trait and types.
//!
//! A middleware takes the request context by value and hands back the
//! (possibly modified) context for the next stage, or an error that aborts
//! the dispatch.
//!
//! # Example
//!
//! ```
//! use hermes_core::{DispatchError, RequestContext};
//! use hermes_middleware::Middleware;
//! use serde_json::json;
//!
//! struct Locale;
//!
//! impl Middleware for Locale {
//!     fn name(&self) -> &str {
//!         "locale"
//!     }
//!
//!     fn handle(&self, mut ctx: RequestContext) -> Result<RequestContext, DispatchError> {
//!         ctx.set_attribute("locale", json!("en"));
//!         Ok(ctx)
//!     }
//! }
//!
//! let ctx = Locale.handle(RequestContext::mock()).unwrap();
//! assert_eq!(ctx.attribute("locale"), Some(&json!("en")));
//! ```

use std::fmt;
use std::sync::Arc;

use hermes_core::{DispatchError, RequestContext};

/// A type-erased middleware that can be stored in a registry or pipeline.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// # Invariants
///
/// - A middleware returns the context it was given (or a replacement); it
///   never runs the handler itself.
/// - An error is fatal for the request and reaches the caller unchanged.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name routes use to reference this middleware.
    fn name(&self) -> &str;

    /// Transforms the request context.
    ///
    /// # Errors
    ///
    /// Any error aborts the pipeline and the dispatch.
    fn handle(&self, ctx: RequestContext) -> Result<RequestContext, DispatchError>;
}

/// A middleware created from a closure.
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_middleware::{FnMiddleware, Middleware};
/// use serde_json::json;
///
/// let mark = FnMiddleware::new("mark", |mut ctx: RequestContext| {
///     ctx.set_attribute("marked", json!(true));
///     Ok(ctx)
/// });
/// assert_eq!(mark.name(), "mark");
/// ```
pub struct FnMiddleware<F> {
    name: String,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(RequestContext) -> Result<RequestContext, DispatchError> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(RequestContext) -> Result<RequestContext, DispatchError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, ctx: RequestContext) -> Result<RequestContext, DispatchError> {
        (self.func)(ctx)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

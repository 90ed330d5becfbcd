//! Ordered middleware pipeline.
//!
//! A pipeline is the global middleware followed by a route's own
//! middleware, in registration order. Stages run strictly one after the
//! other; each stage's output context is the next stage's input. There is
//! no implicit short-circuit: a stage that wants a later stage (or the
//! handler) to react sets a context attribute. The first error stops the
//! pipeline and is returned unchanged.

use std::fmt;
use std::sync::Arc;

use hermes_core::{DispatchError, RequestContext};
use tracing::{debug, warn};

use crate::middleware::{BoxedMiddleware, Middleware};

/// A resolved, ordered list of middleware stages.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_middleware::{FnMiddleware, Pipeline};
/// use serde_json::json;
///
/// let pipeline = Pipeline::builder()
///     .stage(FnMiddleware::new("first", |mut ctx: RequestContext| {
///         ctx.set_attribute("trail", json!("first"));
///         Ok(ctx)
///     }))
///     .stage(FnMiddleware::new("second", |mut ctx: RequestContext| {
///         let trail = ctx.attribute("trail").and_then(|v| v.as_str()).unwrap_or("").to_string();
///         ctx.set_attribute("trail", json!(format!("{trail},second")));
///         Ok(ctx)
///     }))
///     .build();
///
/// let ctx = pipeline.run(RequestContext::mock()).unwrap();
/// assert_eq!(ctx.attribute("trail"), Some(&json!("first,second")));
/// assert_eq!(pipeline.stage_names(), vec!["first", "second"]);
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates a pipeline from already shared stages.
    #[must_use]
    pub fn from_stages(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, unchanged.
    pub fn run(&self, mut ctx: RequestContext) -> Result<RequestContext, DispatchError> {
        for stage in &self.stages {
            debug!(
                stage = stage.name(),
                request_id = %ctx.request_id(),
                "running middleware"
            );
            ctx = stage.handle(ctx).map_err(|e| {
                warn!(stage = stage.name(), error = %e, "middleware failed");
                e
            })?;
        }
        Ok(ctx)
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`] by hand.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, middleware: impl Middleware) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends a shared stage.
    #[must_use]
    pub fn shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnMiddleware;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn append(name: &'static str) -> impl Middleware {
        FnMiddleware::new(name, move |mut ctx: RequestContext| {
            let mut trail = ctx
                .attribute("trail")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            trail.push(json!(name));
            ctx.set_attribute("trail", Value::Array(trail));
            Ok(ctx)
        })
    }

    #[test]
    fn test_empty_pipeline_passes_context_through() {
        let pipeline = Pipeline::default();
        assert!(pipeline.is_empty());
        let ctx = RequestContext::mock();
        let id = ctx.request_id();
        assert_eq!(pipeline.run(ctx).unwrap().request_id(), id);
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::builder()
            .stage(append("a"))
            .stage(append("b"))
            .stage(append("c"))
            .build();

        let ctx = pipeline.run(RequestContext::mock()).unwrap();
        assert_eq!(ctx.attribute("trail"), Some(&json!(["a", "b", "c"])));
        assert_eq!(pipeline.stage_count(), 3);
    }

    #[test]
    fn test_error_stops_pipeline_unchanged() {
        let later = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&later);

        let pipeline = Pipeline::builder()
            .stage(append("a"))
            .stage(FnMiddleware::new("guard", |_ctx: RequestContext| {
                Err(DispatchError::middleware("guard", "not allowed"))
            }))
            .stage(FnMiddleware::new("after", move |ctx: RequestContext| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(ctx)
            }))
            .build();

        let err = pipeline.run(RequestContext::mock()).unwrap_err();
        match err {
            DispatchError::Middleware { stage, message, .. } => {
                assert_eq!(stage, "guard");
                assert_eq!(message, "not allowed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stage_sees_earlier_attributes() {
        let pipeline = Pipeline::builder()
            .stage(FnMiddleware::new("flag", |mut ctx: RequestContext| {
                ctx.set_attribute("maintenance", json!(true));
                Ok(ctx)
            }))
            .stage(FnMiddleware::new("check", |mut ctx: RequestContext| {
                let down = ctx.attribute("maintenance") == Some(&json!(true));
                ctx.set_attribute("checked", json!(down));
                Ok(ctx)
            }))
            .build();

        let ctx = pipeline.run(RequestContext::mock()).unwrap();
        assert_eq!(ctx.attribute("checked"), Some(&json!(true)));
    }
}

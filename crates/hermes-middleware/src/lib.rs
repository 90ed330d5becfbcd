//! # Hermes Middleware
//!
//! The ordered middleware pipeline run before every handler.
//!
//! A [`Middleware`] transforms the [`RequestContext`](hermes_core::RequestContext)
//! and hands it to the next stage. Routes refer to middleware by name; the
//! [`MiddlewareRegistry`] resolves a route's merged list (global middleware
//! first, then the route's own) into a [`Pipeline`].
//!
//! ```text
//! context → global[0] → … → global[n] → route[0] → … → route[m] → handler
//! ```
//!
//! ## Key Features
//!
//! - **Sequential**: each stage's output is the next stage's input
//! - **No implicit short-circuit**: stages communicate through context attributes
//! - **Fatal errors**: the first stage error aborts the dispatch unchanged
//! - **Validation stage**: [`stages::ValidationStage`] runs a rule set against the input batch

#![doc(html_root_url = "https://docs.rs/hermes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod registry;
pub mod stages;

pub use middleware::{BoxedMiddleware, FnMiddleware, Middleware};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use registry::MiddlewareRegistry;

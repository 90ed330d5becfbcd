//! # Hermes Core
//!
//! Shared vocabulary for the Hermes dispatch crates:
//!
//! - [`RequestContext`] - Per-request state: captures, options, input, attributes, binding cache
//! - [`RequestId`] - UUID v7 request identifier
//! - [`DispatchError`] - Standard error type with status-code categories
//! - [`ServiceRegistry`] - Type-keyed singletons for injection
//! - [`ParamSpec`], [`Action`], [`Controller`], [`HandlerRegistry`] - Handler descriptors
//! - [`Persistence`], [`Entity`], [`EntityRegistry`], [`BindingCache`] - Model binding boundary
//! - [`coerce`] - The scalar coercion table
//! - [`Response`] - The response boundary

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod di;
mod entity;
mod error;
pub mod fixtures;
mod handler;
mod outcome;
mod response;
mod value;

pub use context::{RequestContext, RequestId, RouteInfo};
pub use di::{ServiceRegistry, SharedService};
pub use entity::{BindingCache, Entity, EntityRegistry, Persistence};
pub use error::{
    DispatchError, DispatchResult, ErrorCategory, ErrorDetail, ErrorEnvelope, PersistenceError,
};
pub use handler::{
    Action, ActionFn, Argument, Arguments, Controller, DeclaredType, HandlerRegistry, Invocation,
    ParamSpec, OPTIONS_PARAM,
};
pub use outcome::ValidationOutcome;
pub use response::{body_text, json, json_response, text_response, IntoResponse, Response};
pub use value::{as_number, coerce, is_numeric, to_text, ScalarType};

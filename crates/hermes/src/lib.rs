//! # Hermes
//!
//! **Request and command dispatch core**
//!
//! Hermes matches a URL path or a command line against a route table, runs
//! the route's middleware pipeline, binds the handler's declared parameters
//! (captured values, injected services, entities loaded through a
//! persistence collaborator) and invokes the handler. A validation rule
//! engine shares the binder's coercion table and entity cache.
//!
//! - **Routing** – `{variable}` patterns over path segments or command words
//! - **Binding** – explicit parameter descriptors, no reflection
//! - **Middleware** – named stages, global stages first
//! - **Validation** – compact rule tokens such as `required|min:5|!same:@old`
//!
//! ## Quick Start
//!
//! ```
//! use hermes::prelude::*;
//! use serde_json::json;
//!
//! let app = Application::builder()
//!     .controller(Controller::new("users").action(Action::new(
//!         "show",
//!         vec![ParamSpec::scalar("id", ScalarType::Int)],
//!         |inv| Ok(json!({ "id": inv.arguments().value("id") })),
//!     )))
//!     .web(http::Method::GET, "/users/{id}", "users", "show", &[])
//!     .boot()
//!     .unwrap();
//!
//! let response = app.handle(WebRequest::get("/users/7"));
//! assert_eq!(body_text(&response), r#"{"id":7}"#);
//! ```
//!
//! ## Flow
//!
//! ```text
//! path / argv → RouteTable → Pipeline (global, then route) → Binder → Action
//!                                          ↓
//!                                   ValidationStage
//! ```

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod builder;
pub mod command;
pub mod dispatcher;
mod error;
mod lifecycle;

pub use hermes_bind as bind;
pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_middleware as middleware;
pub use hermes_router as router;
pub use hermes_telemetry as telemetry;
pub use hermes_validation as validation;

pub use application::Application;
pub use builder::{ApplicationBuilder, Fallback};
pub use command::{CommandLine, CommandOutput};
pub use dispatcher::WebRequest;
pub use error::{ApplicationError, ApplicationResult};
pub use lifecycle::{Lifecycle, ShutdownHook};

pub use hermes_core::{
    body_text, Action, Controller, DispatchError, Entity, ParamSpec, Persistence,
    RequestContext, Response, ScalarType,
};

/// Common imports for building and dispatching an application.
///
/// ```
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Application, ApplicationBuilder, ApplicationError, CommandOutput, WebRequest,
    };

    pub use hermes_core::{
        body_text, json, text_response, Action, Controller, DispatchError, Entity, Invocation,
        IntoResponse, ParamSpec, Persistence, PersistenceError, RequestContext, Response,
        ScalarType,
    };

    pub use hermes_config::{ConfigLoader, HermesConfig};
    pub use hermes_middleware::{FnMiddleware, Middleware};
    pub use hermes_router::{HandlerRef, RequestKind, RouteDeclaration};
    pub use hermes_validation::{RuleSet, ValidationOutcome, Validator};
}

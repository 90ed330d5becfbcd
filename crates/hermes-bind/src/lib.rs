//! Handler parameter binding for Hermes.
//!
//! Given an action's declared parameters and a [`RequestContext`], the
//! [`Binder`] produces the [`Arguments`] the action is invoked with:
//! context injection, service injection, model binding of entities from
//! captured keys, scalar coercion of captured variables, CLI options and
//! defaults.
//!
//! Controller constructor dependencies are bound separately with
//! [`Binder::bind_dependencies`].
//!
//! [`RequestContext`]: hermes_core::RequestContext
//! [`Arguments`]: hermes_core::Arguments

#![doc(html_root_url = "https://docs.rs/hermes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod source;

pub use binder::{usage_for, Binder};
pub use source::{BindMode, BindSource};

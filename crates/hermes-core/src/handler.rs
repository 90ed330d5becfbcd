//! Handler descriptors.
//!
//! Controllers and actions are registered with explicit parameter
//! descriptors ([`ParamSpec`]). The binder reads those descriptors to build
//! an [`Arguments`] set, and the action function receives it inside an
//! [`Invocation`].
//!
//! # Example
//!
//! ```
//! use hermes_core::{Action, Controller, HandlerRegistry, ParamSpec, ScalarType};
//! use hermes_router::HandlerRef;
//!
//! let users = Controller::new("users").action(Action::new(
//!     "show",
//!     vec![ParamSpec::scalar("id", ScalarType::Int)],
//!     |inv| {
//!         let id: i64 = inv.arguments().get("id")?;
//!         Ok(format!("user {id}"))
//!     },
//! ));
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(users);
//! assert!(registry.resolve(&HandlerRef::new("users", "show")).is_ok());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hermes_router::HandlerRef;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::RequestContext;
use crate::di::SharedService;
use crate::entity::Entity;
use crate::error::DispatchError;
use crate::response::{IntoResponse, Response};
use crate::value::ScalarType;

/// Name of the parameter that receives the CLI options bag.
pub const OPTIONS_PARAM: &str = "options";

/// What a handler parameter is declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// The live request context.
    Context,
    /// A persistent entity of the named type.
    Entity(String),
    /// A registered service.
    Service {
        /// The service's type identity.
        id: TypeId,
        /// The service's type name, for messages.
        type_name: &'static str,
    },
    /// A scalar coerced from a captured value.
    Scalar(ScalarType),
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    ty: DeclaredType,
    default: Option<Value>,
}

impl ParamSpec {
    /// A parameter receiving the request context.
    #[must_use]
    pub fn context(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Context)
    }

    /// A parameter bound to an entity of `entity_type`.
    #[must_use]
    pub fn entity(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Entity(entity_type.into()))
    }

    /// A parameter injected from the service registry.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::new(
            name,
            DeclaredType::Service {
                id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            },
        )
    }

    /// A scalar parameter.
    #[must_use]
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(name, DeclaredType::Scalar(ty))
    }

    /// The CLI options bag.
    #[must_use]
    pub fn options() -> Self {
        Self::new(OPTIONS_PARAM, DeclaredType::Scalar(ScalarType::Any)).with_default(Value::Null)
    }

    fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Sets the default used when no value is available.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub const fn ty(&self) -> &DeclaredType {
        &self.ty
    }

    /// The default value, if any.
    #[must_use]
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// True for the CLI options bag parameter.
    #[must_use]
    pub fn is_options(&self) -> bool {
        self.name == OPTIONS_PARAM
    }

    /// True for scalar parameters that positional command tokens bind to.
    #[must_use]
    pub fn is_positional(&self) -> bool {
        matches!(self.ty, DeclaredType::Scalar(_)) && !self.is_options()
    }
}

/// One bound argument.
#[derive(Clone)]
pub enum Argument {
    /// The parameter asked for the request context.
    Context,
    /// A bound entity.
    Entity(Entity),
    /// An injected service.
    Service(SharedService),
    /// A coerced scalar, a default or the options bag.
    Value(Value),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => f.write_str("Context"),
            Self::Entity(entity) => f.debug_tuple("Entity").field(entity).finish(),
            Self::Service(_) => f.write_str("Service(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Name-keyed bound arguments, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, Argument>,
}

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        self.values.insert(name.into(), argument);
    }

    /// The raw argument.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Argument> {
        self.values.get(name)
    }

    /// The argument as a JSON value. Entities read as their attribute object.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        match self.values.get(name)? {
            Argument::Value(value) => Some(value.clone()),
            Argument::Entity(entity) => Some(entity.clone().into_value()),
            Argument::Context | Argument::Service(_) => None,
        }
    }

    /// Deserializes an argument into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] if the argument is absent or
    /// does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, DispatchError> {
        let value = self
            .value(name)
            .ok_or_else(|| DispatchError::invalid_argument(name, "not bound to a value"))?;
        serde_json::from_value(value).map_err(|e| DispatchError::invalid_argument(name, e.to_string()))
    }

    /// The bound entity.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        match self.values.get(name)? {
            Argument::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// The injected service, downcast to `T`.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        match self.values.get(name)? {
            Argument::Service(service) => Arc::clone(service).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// True when an argument with this name was bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Argument names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything an action receives when it runs.
#[derive(Debug)]
pub struct Invocation<'a> {
    context: &'a RequestContext,
    dependencies: Arguments,
    arguments: Arguments,
}

impl<'a> Invocation<'a> {
    /// Creates an invocation.
    #[must_use]
    pub fn new(context: &'a RequestContext, dependencies: Arguments, arguments: Arguments) -> Self {
        Self {
            context,
            dependencies,
            arguments,
        }
    }

    /// The request context, when the action declared a context parameter.
    #[must_use]
    pub fn context(&self) -> Option<&'a RequestContext> {
        self.arguments
            .values
            .values()
            .any(|a| matches!(a, Argument::Context))
            .then_some(self.context)
    }

    /// The controller's constructor dependencies.
    #[must_use]
    pub const fn dependencies(&self) -> &Arguments {
        &self.dependencies
    }

    /// The action's bound arguments.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// Type-erased action function.
pub type ActionFn =
    Arc<dyn for<'a> Fn(Invocation<'a>) -> Result<Response, DispatchError> + Send + Sync>;

/// A named controller action with its declared parameters.
#[derive(Clone)]
pub struct Action {
    name: String,
    params: Vec<ParamSpec>,
    func: ActionFn,
}

impl Action {
    /// Creates an action from a function returning anything convertible into
    /// a response.
    pub fn new<F, R>(name: impl Into<String>, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a>) -> Result<R, DispatchError> + Send + Sync + 'static,
        R: IntoResponse,
    {
        let func: ActionFn =
            Arc::new(move |inv: Invocation<'_>| func(inv).map(IntoResponse::into_response));
        Self {
            name: name.into(),
            params,
            func,
        }
    }

    /// The action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Positional scalar parameters without a default.
    #[must_use]
    pub fn required_positional(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.is_positional() && p.default().is_none())
            .count()
    }

    /// All positional scalar parameters.
    #[must_use]
    pub fn total_positional(&self) -> usize {
        self.params.iter().filter(|p| p.is_positional()).count()
    }

    /// Runs the action.
    ///
    /// # Errors
    ///
    /// Returns whatever error the action function returns.
    pub fn invoke(&self, invocation: Invocation<'_>) -> Result<Response, DispatchError> {
        (self.func)(invocation)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A controller: constructor dependencies plus named actions.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    dependencies: Vec<ParamSpec>,
    actions: HashMap<String, Action>,
}

impl Controller {
    /// Creates a controller with no dependencies and no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            actions: HashMap::new(),
        }
    }

    /// Declares a constructor dependency. Only services and defaults bind here.
    #[must_use]
    pub fn depends_on(mut self, param: ParamSpec) -> Self {
        self.dependencies.push(param);
        self
    }

    /// Adds an action, replacing one of the same name.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.insert(action.name.clone(), action);
        self
    }

    /// The controller name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constructor dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[ParamSpec] {
        &self.dependencies
    }

    /// Looks up an action.
    #[must_use]
    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }
}

/// All registered controllers, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    controllers: HashMap<String, Controller>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller, replacing one of the same name.
    pub fn register(&mut self, controller: Controller) {
        self.controllers.insert(controller.name.clone(), controller);
    }

    /// Looks up a controller.
    #[must_use]
    pub fn controller(&self, name: &str) -> Option<&Controller> {
        self.controllers.get(name)
    }

    /// Resolves a route's handler to its controller and action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerResolution`] when either is missing.
    pub fn resolve(&self, handler: &HandlerRef) -> Result<(&Controller, &Action), DispatchError> {
        let controller = self.controllers.get(handler.controller()).ok_or_else(|| {
            DispatchError::handler_resolution(handler, "controller not registered")
        })?;
        let action = controller
            .get_action(handler.action())
            .ok_or_else(|| DispatchError::handler_resolution(handler, "action not found"))?;
        Ok((controller, action))
    }

    /// Number of controllers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// True when no controller is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Clock;

    #[test]
    fn test_param_spec_constructors() {
        let p = ParamSpec::scalar("page", ScalarType::Int).with_default(json!(1));
        assert_eq!(p.name(), "page");
        assert_eq!(p.default(), Some(&json!(1)));
        assert!(p.is_positional());

        let s = ParamSpec::service::<Clock>("clock");
        assert!(matches!(s.ty(), DeclaredType::Service { id, .. } if *id == TypeId::of::<Clock>()));
        assert!(!s.is_positional());

        assert!(!ParamSpec::options().is_positional());
    }

    #[test]
    fn test_positional_counts() {
        let action = Action::new(
            "make",
            vec![
                ParamSpec::scalar("name", ScalarType::String),
                ParamSpec::scalar("table", ScalarType::String).with_default(json!("")),
                ParamSpec::options(),
                ParamSpec::context("ctx"),
            ],
            |_| Ok("ok"),
        );
        assert_eq!(action.required_positional(), 1);
        assert_eq!(action.total_positional(), 2);
    }

    #[test]
    fn test_arguments_accessors() {
        let mut args = Arguments::new();
        args.insert("id", Argument::Value(json!(7)));
        args.insert("clock", Argument::Service(Arc::new(Clock)));

        assert_eq!(args.get::<i64>("id").unwrap(), 7);
        assert!(args.service::<Clock>("clock").is_some());
        assert!(args.service::<String>("clock").is_none());
        assert!(matches!(
            args.get::<i64>("missing"),
            Err(DispatchError::InvalidArgument { .. })
        ));
        assert!(matches!(
            args.get::<String>("id"),
            Err(DispatchError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_invocation_context_only_when_declared() {
        let ctx = RequestContext::mock();
        let inv = Invocation::new(&ctx, Arguments::new(), Arguments::new());
        assert!(inv.context().is_none());

        let mut args = Arguments::new();
        args.insert("request", Argument::Context);
        let inv = Invocation::new(&ctx, Arguments::new(), args);
        assert_eq!(inv.context().unwrap().request_id(), ctx.request_id());
    }

    #[test]
    fn test_registry_resolution_errors() {
        let mut registry = HandlerRegistry::new();
        registry.register(Controller::new("users").action(Action::new("index", vec![], |_| Ok("list"))));

        assert!(registry.resolve(&HandlerRef::new("users", "index")).is_ok());

        let err = registry.resolve(&HandlerRef::new("posts", "index")).unwrap_err();
        assert!(err.to_string().contains("controller not registered"));

        let err = registry.resolve(&HandlerRef::new("users", "destroy")).unwrap_err();
        assert!(err.to_string().contains("action not found"));
    }

    #[test]
    fn test_action_invoke_converts_response() {
        let action = Action::new("hello", vec![], |_| Ok(String::from("hi")));
        let ctx = RequestContext::mock();
        let response = action
            .invoke(Invocation::new(&ctx, Arguments::new(), Arguments::new()))
            .unwrap();
        assert_eq!(response.body().as_ref(), b"hi");
    }
}

//! The parameter binder.
//!
//! Each declared parameter is resolved exactly once. The first rule that
//! applies wins:
//!
//! 1. [`DeclaredType::Context`]: the live request context (first such
//!    parameter only; later ones are not passed).
//! 2. [`DeclaredType::Entity`] of a registered type, web mode only: the
//!    captured variable named like the parameter is the key. An entity of
//!    that type cached under the parameter name with the same key is reused,
//!    otherwise the persistence collaborator is asked. A miss is
//!    [`DispatchError::EntityNotFound`]. The bound entity is written back
//!    to the binding cache.
//! 3. [`DeclaredType::Service`] registered in the service registry: the
//!    singleton.
//! 4. The captured variable with the parameter's name, or the CLI options
//!    bag for a parameter named `options`, coerced to the declared scalar
//!    type. Other declared types take the raw value.
//! 5. The parameter's default.
//! 6. Otherwise [`DispatchError::MissingArgument`] with the usage text.

use hermes_core::{
    coerce, Argument, Arguments, DeclaredType, DispatchError, Entity, EntityRegistry, ParamSpec,
    Persistence, RequestContext, ScalarType, ServiceRegistry,
};
use hermes_router::RequestKind;
use serde_json::Value;
use tracing::{debug, warn};

use crate::source::{BindMode, BindSource};

/// Builds argument sets for controller constructors and actions.
///
/// # Example
///
/// ```
/// use hermes_bind::{BindMode, Binder};
/// use hermes_core::{EntityRegistry, ParamSpec, RequestContext, ScalarType, ServiceRegistry};
/// use serde_json::json;
///
/// let services = ServiceRegistry::new();
/// let entities = EntityRegistry::new();
/// let binder = Binder::new(&services, &entities);
///
/// let mut ctx = RequestContext::mock();
/// ctx.set_capture("page", "3");
///
/// let params = [ParamSpec::scalar("page", ScalarType::Int)];
/// let args = binder
///     .bind_action(&params, &mut ctx, BindMode::Web, "GET /posts/{page}")
///     .unwrap();
/// assert_eq!(args.value("page"), Some(json!(3)));
/// ```
#[derive(Clone, Copy)]
pub struct Binder<'a> {
    services: &'a ServiceRegistry,
    entities: &'a EntityRegistry,
    persistence: Option<&'a dyn Persistence>,
}

impl<'a> Binder<'a> {
    /// Creates a binder without a persistence collaborator.
    #[must_use]
    pub fn new(services: &'a ServiceRegistry, entities: &'a EntityRegistry) -> Self {
        Self {
            services,
            entities,
            persistence: None,
        }
    }

    /// Sets the persistence collaborator used for model binding.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Option<&'a dyn Persistence>) -> Self {
        self.persistence = persistence;
        self
    }

    /// Binds an action's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingArgument`], [`DispatchError::EntityNotFound`],
    /// a handler resolution error when model binding has no persistence
    /// collaborator, or a persistence failure.
    pub fn bind_action(
        &self,
        params: &[ParamSpec],
        ctx: &mut RequestContext,
        mode: BindMode,
        usage: &str,
    ) -> Result<Arguments, DispatchError> {
        let mut arguments = Arguments::new();
        let mut context_bound = false;

        for param in params {
            if matches!(param.ty(), DeclaredType::Context) {
                if context_bound {
                    debug!(parameter = param.name(), "second context parameter not passed");
                    continue;
                }
                context_bound = true;
                arguments.insert(param.name(), Argument::Context);
                debug!(parameter = param.name(), source = %BindSource::Context, "parameter bound");
                continue;
            }

            let (argument, source) = self.resolve(param, ctx, mode, usage)?;
            debug!(parameter = param.name(), source = %source, "parameter bound");
            arguments.insert(param.name(), argument);
        }

        Ok(arguments)
    }

    /// Binds a controller's constructor dependencies: services, then
    /// defaults, else a missing argument.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingArgument`] for an unregistered service
    /// without a default.
    pub fn bind_dependencies(
        &self,
        params: &[ParamSpec],
        usage: &str,
    ) -> Result<Arguments, DispatchError> {
        let mut arguments = Arguments::new();
        for param in params {
            let (argument, source) = match self.service(param) {
                Some(service) => (service, BindSource::Service),
                None => fallback(param, usage)?,
            };
            debug!(dependency = param.name(), source = %source, "dependency bound");
            arguments.insert(param.name(), argument);
        }
        Ok(arguments)
    }

    fn resolve(
        &self,
        param: &ParamSpec,
        ctx: &mut RequestContext,
        mode: BindMode,
        usage: &str,
    ) -> Result<(Argument, BindSource), DispatchError> {
        if let DeclaredType::Entity(entity_type) = param.ty() {
            if mode == BindMode::Web {
                if let Some(key_column) = self.entities.key_column(entity_type) {
                    let Some(key) = ctx.capture(param.name()).map(str::to_string) else {
                        return fallback(param, usage);
                    };
                    let (entity, source) =
                        self.bind_entity(ctx, param.name(), entity_type, key_column, &key)?;
                    return Ok((Argument::Entity(entity), source));
                }
            }
        }

        if let Some(service) = self.service(param) {
            return Ok((service, BindSource::Service));
        }

        if param.is_options() && (mode == BindMode::Command || !ctx.options().is_empty()) {
            let bag = ctx
                .options()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return Ok((Argument::Value(Value::Object(bag)), BindSource::Options));
        }

        if let Some(raw) = ctx.capture(param.name()) {
            let ty = match param.ty() {
                DeclaredType::Scalar(ty) => *ty,
                _ => ScalarType::Any,
            };
            let value = coerce(Value::String(raw.to_string()), ty);
            return Ok((Argument::Value(value), BindSource::Capture));
        }

        fallback(param, usage)
    }

    fn service(&self, param: &ParamSpec) -> Option<Argument> {
        match param.ty() {
            DeclaredType::Service { id, .. } => {
                self.services.resolve_by_id(*id).map(Argument::Service)
            }
            _ => None,
        }
    }

    fn bind_entity(
        &self,
        ctx: &mut RequestContext,
        slot: &str,
        entity_type: &str,
        key_column: &str,
        key: &str,
    ) -> Result<(Entity, BindSource), DispatchError> {
        let key_value = Value::String(key.to_string());

        if let Some(cached) = ctx.bindings().get(slot, entity_type) {
            if cached.has_key(&key_value) {
                return Ok((cached.clone(), BindSource::CachedEntity));
            }
        }

        let persistence = self.persistence.ok_or_else(|| {
            DispatchError::handler_resolution(
                entity_type,
                "no persistence collaborator for model binding",
            )
        })?;

        let Some(entity) = persistence.find_one(entity_type, key_column, &key_value)? else {
            warn!(entity = entity_type, key, "model binding found no entity");
            return Err(DispatchError::entity_not_found(entity_type, key));
        };

        ctx.bindings_mut().insert(slot, entity.clone());
        Ok((entity, BindSource::FetchedEntity))
    }
}

impl std::fmt::Debug for Binder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("services", &self.services.len())
            .field("entities", &self.entities.len())
            .field("persistence", &self.persistence.is_some())
            .finish()
    }
}

fn fallback(param: &ParamSpec, usage: &str) -> Result<(Argument, BindSource), DispatchError> {
    match param.default() {
        Some(default) => Ok((Argument::Value(default.clone()), BindSource::Default)),
        None => {
            warn!(parameter = param.name(), usage, "missing argument");
            Err(DispatchError::missing_argument(param.name(), usage))
        }
    }
}

/// The expected invocation shape of a route, e.g. `GET /users/{user}` or
/// `make:migration {name}`.
#[must_use]
pub fn usage_for(kind: &RequestKind, pattern: &str) -> String {
    match kind {
        RequestKind::Http(method) => format!("{method} {pattern}"),
        RequestKind::Command(_) => pattern.to_string(),
    }
}

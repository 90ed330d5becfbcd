//! Application assembly.
//!
//! Everything an [`Application`] needs is registered on an
//! [`ApplicationBuilder`] and frozen by [`ApplicationBuilder::boot`]. After
//! boot the route table and every registry are read-only.

use std::sync::Arc;

use hermes_config::HermesConfig;
use hermes_core::{
    Controller, EntityRegistry, HandlerRegistry, Persistence, RequestContext, Response,
    ServiceRegistry,
};
use hermes_middleware::stages::ValidationStage;
use hermes_middleware::{Middleware, MiddlewareRegistry};
use hermes_router::{HandlerRef, RequestKind, RouteDeclaration, RouteTable};
use hermes_validation::{RuleSet, Validator};
use http::Method;
use tracing::{debug, info, warn};

use crate::application::Application;
use crate::error::{ApplicationError, ApplicationResult};
use crate::lifecycle::Lifecycle;

/// Response producer for requests no route matched.
pub type Fallback = Arc<dyn Fn(&RequestContext) -> Response + Send + Sync>;

/// Where a pending route is registered once the configuration is final.
#[derive(Debug, Clone)]
enum RouteKind {
    Explicit(RequestKind),
    Console,
}

#[derive(Debug, Clone)]
struct PendingRoute {
    kind: RouteKind,
    pattern: String,
    handler: HandlerRef,
    middleware: Vec<String>,
}

/// Builder for [`Application`].
///
/// # Example
///
/// ```
/// use hermes::{Action, ApplicationBuilder, Controller, ParamSpec, ScalarType};
/// use http::Method;
///
/// let app = ApplicationBuilder::new()
///     .controller(Controller::new("greet").action(Action::new(
///         "hello",
///         vec![ParamSpec::scalar("name", ScalarType::String)],
///         |inv| Ok(format!("hello {}", inv.arguments().get::<String>("name")?)),
///     )))
///     .web(Method::GET, "/hello/{name}", "greet", "hello", &[])
///     .command("greet {name}", "greet", "hello", &[])
///     .boot()
///     .unwrap();
///
/// assert_eq!(app.routes().len(), 2);
/// ```
pub struct ApplicationBuilder {
    config: HermesConfig,
    routes: Vec<PendingRoute>,
    handlers: HandlerRegistry,
    services: ServiceRegistry,
    entities: EntityRegistry,
    middleware: MiddlewareRegistry,
    validation_stages: Vec<(String, RuleSet)>,
    validator: Option<Validator>,
    persistence: Option<Arc<dyn Persistence>>,
    fallback: Option<Fallback>,
    lifecycle: Lifecycle,
    telemetry: bool,
}

impl ApplicationBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(HermesConfig::default())
    }

    /// Creates a builder from a loaded configuration.
    #[must_use]
    pub fn from_config(config: HermesConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            handlers: HandlerRegistry::new(),
            services: ServiceRegistry::new(),
            entities: EntityRegistry::new(),
            middleware: MiddlewareRegistry::new(),
            validation_stages: Vec::new(),
            validator: None,
            persistence: None,
            fallback: None,
            lifecycle: Lifecycle::new(),
            telemetry: false,
        }
    }

    /// The configuration the application will boot with.
    #[must_use]
    pub fn config(&self) -> &HermesConfig {
        &self.config
    }

    /// Sets the middleware run before every route's own middleware.
    pub fn global_middleware<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.dispatch.global_middleware = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request kind used for console commands.
    pub fn command_kind(mut self, kind: impl Into<String>) -> Self {
        self.config.dispatch.command_kind = kind.into();
        self
    }

    /// Installs logging from the configuration's `logging` section at boot.
    pub fn with_telemetry(mut self) -> Self {
        self.telemetry = true;
        self
    }

    /// Declares a route of any kind.
    pub fn route(
        mut self,
        kind: RequestKind,
        pattern: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        middleware: &[&str],
    ) -> Self {
        self.push_route(RouteKind::Explicit(kind), pattern, controller, action, middleware);
        self
    }

    /// Declares a web route.
    pub fn web(
        self,
        method: Method,
        pattern: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        middleware: &[&str],
    ) -> Self {
        self.route(RequestKind::http(method), pattern, controller, action, middleware)
    }

    /// Declares a console command under the configured command kind.
    pub fn command(
        mut self,
        pattern: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        middleware: &[&str],
    ) -> Self {
        self.push_route(RouteKind::Console, pattern, controller, action, middleware);
        self
    }

    /// Adds route declarations produced by a loader.
    pub fn declarations<I>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = RouteDeclaration>,
    {
        self.routes
            .extend(declarations.into_iter().map(|decl| PendingRoute {
                kind: RouteKind::Explicit(decl.kind),
                pattern: decl.pattern,
                handler: decl.handler,
                middleware: decl.middleware,
            }));
        self
    }

    fn push_route(
        &mut self,
        kind: RouteKind,
        pattern: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
        middleware: &[&str],
    ) {
        self.routes.push(PendingRoute {
            kind,
            pattern: pattern.into(),
            handler: HandlerRef::new(controller, action),
            middleware: middleware.iter().map(ToString::to_string).collect(),
        });
    }

    /// Registers a controller.
    pub fn controller(mut self, controller: Controller) -> Self {
        self.handlers.register(controller);
        self
    }

    /// Registers a singleton service.
    pub fn service<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.services.register(service);
        self
    }

    /// Registers an entity type for model binding.
    pub fn entity(mut self, entity_type: impl Into<String>, key_column: impl Into<String>) -> Self {
        self.entities.register(entity_type, key_column);
        self
    }

    /// Registers a middleware under its own name.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.register(middleware);
        self
    }

    /// Registers a validation stage named `name` that runs `rules` against
    /// the request input.
    pub fn validation_stage(mut self, name: impl Into<String>, rules: RuleSet) -> Self {
        self.validation_stages.push((name.into(), rules));
        self
    }

    /// Replaces the default validator.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the persistence collaborator for model binding and `unique`.
    pub fn persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Sets the response for web requests no route matched.
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&RequestContext) -> Response + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Adds a hook run by [`Application::shutdown`].
    pub fn on_shutdown<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: FnOnce(&ServiceRegistry) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.lifecycle.on_shutdown(name, hook);
        self
    }

    /// Validates the configuration, compiles every route and freezes the
    /// registries.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration, a route pattern that
    /// does not compile, a configured validation pattern that does not
    /// compile, or a logging setup failure.
    pub fn boot(self) -> ApplicationResult<Application> {
        let Self {
            config,
            routes: pending,
            handlers,
            mut services,
            entities,
            mut middleware,
            validation_stages,
            validator,
            persistence,
            fallback,
            lifecycle,
            telemetry,
        } = self;

        config.validate()?;
        if telemetry {
            hermes_telemetry::init_telemetry(&config.logging.to_log_config())?;
        }

        let console = RequestKind::command(config.dispatch.command_kind.clone());
        let mut routes = RouteTable::with_global_middleware(config.dispatch.global_middleware.clone());
        for route in pending {
            let kind = match route.kind {
                RouteKind::Explicit(kind) => kind,
                RouteKind::Console => console.clone(),
            };
            let entry = routes
                .register(kind, &route.pattern, route.handler, route.middleware)
                .map_err(|source| ApplicationError::route(&route.pattern, source))?;
            debug!(kind = %entry.kind(), pattern = entry.pattern().source(), handler = %entry.handler(), "route registered");
        }

        let mut validator = validator.unwrap_or_else(Validator::new);
        for (name, pattern) in &config.validation.patterns {
            validator.add_pattern(name.as_str(), &pattern.regex, pattern.message.clone())?;
        }
        for (operation, template) in &config.validation.messages {
            validator.set_message(operation.as_str(), template.as_str());
        }
        if let Some(persistence) = &persistence {
            validator.set_persistence(Arc::clone(persistence));
        }
        let validator = Arc::new(validator);
        services.register(Arc::clone(&validator));

        for (name, rules) in validation_stages {
            middleware.register(ValidationStage::new(name, Arc::clone(&validator), rules));
        }

        for route in routes.iter() {
            for name in route.middleware() {
                if !middleware.contains(name) {
                    warn!(
                        pattern = route.pattern().source(),
                        middleware = %name,
                        "route references unregistered middleware"
                    );
                }
            }
        }

        info!(
            app = %config.app.name,
            environment = %config.app.environment,
            routes = routes.len(),
            controllers = handlers.len(),
            services = services.len(),
            middleware = middleware.len(),
            "application booted"
        );

        Ok(Application {
            config,
            routes,
            handlers,
            services,
            entities,
            middleware,
            validator,
            persistence,
            fallback,
            console,
            lifecycle,
        })
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("controllers", &self.handlers.len())
            .field("services", &self.services.len())
            .field("middleware", &self.middleware.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Action, ParamSpec, ScalarType};
    use hermes_middleware::FnMiddleware;

    fn greet() -> Controller {
        Controller::new("greet").action(Action::new(
            "hello",
            vec![ParamSpec::scalar("name", ScalarType::String)],
            |inv| Ok(format!("hello {}", inv.arguments().get::<String>("name")?)),
        ))
    }

    #[test]
    fn test_boot_registers_routes() {
        let app = ApplicationBuilder::new()
            .controller(greet())
            .web(Method::GET, "/hello/{name}", "greet", "hello", &[])
            .command("greet {name}", "greet", "hello", &[])
            .boot()
            .unwrap();

        assert_eq!(app.routes().len(), 2);
        assert!(app
            .routes()
            .lookup_str(&RequestKind::console(), "greet ada")
            .is_some());
    }

    #[test]
    fn test_command_kind_comes_from_config() {
        let app = ApplicationBuilder::new()
            .command_kind("artisan")
            .controller(greet())
            .command("greet {name}", "greet", "hello", &[])
            .boot()
            .unwrap();

        assert!(app
            .routes()
            .lookup_str(&RequestKind::command("artisan"), "greet ada")
            .is_some());
        assert!(app
            .routes()
            .lookup_str(&RequestKind::console(), "greet ada")
            .is_none());
    }

    #[test]
    fn test_global_middleware_is_merged_first() {
        let app = ApplicationBuilder::new()
            .global_middleware(["trim"])
            .middleware(FnMiddleware::new("trim", |ctx: RequestContext| Ok(ctx)))
            .middleware(FnMiddleware::new("auth", |ctx: RequestContext| Ok(ctx)))
            .controller(greet())
            .web(Method::GET, "/hello/{name}", "greet", "hello", &["auth", "trim"])
            .boot()
            .unwrap();

        let route = app.routes().iter().next().unwrap();
        assert_eq!(route.middleware(), ["trim", "auth"]);
    }

    #[test]
    fn test_bad_pattern_fails_boot() {
        let err = ApplicationBuilder::new()
            .web(Method::GET, "/users/{id}/{id}", "users", "show", &[])
            .boot()
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Route { ref pattern, .. } if pattern == "/users/{id}/{id}"));
    }

    #[test]
    fn test_bad_config_pattern_fails_boot() {
        let mut config = HermesConfig::default();
        config.validation.patterns.insert(
            "broken".to_string(),
            hermes_config::PatternConfig {
                regex: "([".to_string(),
                message: None,
            },
        );

        let err = ApplicationBuilder::from_config(config).boot().unwrap_err();
        assert!(matches!(err, ApplicationError::Config(_)));
    }

    #[test]
    fn test_validator_is_injectable() {
        let app = ApplicationBuilder::new().boot().unwrap();
        assert!(app.services().contains::<Validator>());
    }
}

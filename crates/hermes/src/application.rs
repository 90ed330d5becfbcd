//! The booted application.

use std::sync::Arc;

use hermes_config::HermesConfig;
use hermes_core::{EntityRegistry, HandlerRegistry, Persistence, ServiceRegistry};
use hermes_middleware::MiddlewareRegistry;
use hermes_router::{RequestKind, RouteTable};
use hermes_validation::Validator;
use tracing::info;

use crate::builder::{ApplicationBuilder, Fallback};
use crate::error::ApplicationResult;
use crate::lifecycle::Lifecycle;

/// A booted application: read-only registries plus the dispatch entry
/// points in [`dispatcher`](crate::dispatcher).
///
/// `Application` is `Send + Sync` and can be shared through an `Arc`.
pub struct Application {
    pub(crate) config: HermesConfig,
    pub(crate) routes: RouteTable,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) services: ServiceRegistry,
    pub(crate) entities: EntityRegistry,
    pub(crate) middleware: MiddlewareRegistry,
    pub(crate) validator: Arc<Validator>,
    pub(crate) persistence: Option<Arc<dyn Persistence>>,
    pub(crate) fallback: Option<Fallback>,
    pub(crate) console: RequestKind,
    pub(crate) lifecycle: Lifecycle,
}

impl Application {
    /// Starts building an application.
    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The configuration the application booted with.
    #[must_use]
    pub const fn config(&self) -> &HermesConfig {
        &self.config
    }

    /// The route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The controller registry.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// The service registry.
    #[must_use]
    pub const fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// The middleware registry.
    #[must_use]
    pub const fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    /// The shared validator.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The request kind console commands are registered under.
    #[must_use]
    pub const fn console_kind(&self) -> &RequestKind {
        &self.console
    }

    /// Runs the shutdown hooks in reverse registration order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure after every hook has run.
    pub fn shutdown(self) -> ApplicationResult<()> {
        info!(
            app = %self.config.app.name,
            hooks = self.lifecycle.shutdown_hook_count(),
            "shutting down"
        );
        let result = self.lifecycle.run_shutdown(&self.services);
        info!("shutdown complete");
        result
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("app", &self.config.app.name)
            .field("routes", &self.routes.len())
            .field("controllers", &self.handlers.len())
            .field("services", &self.services.len())
            .field("middleware", &self.middleware.len())
            .field("console", &self.console)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_application_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Application>();
    }

    #[test]
    fn test_shutdown_runs_hooks() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (Arc::clone(&ran), Arc::clone(&ran));

        let app = Application::builder()
            .on_shutdown("first", move |_| {
                first.lock().unwrap().push("first");
                Ok(())
            })
            .on_shutdown("second", move |_| {
                second.lock().unwrap().push("second");
                Ok(())
            })
            .boot()
            .unwrap();

        app.shutdown().unwrap();
        assert_eq!(*ran.lock().unwrap(), vec!["second", "first"]);
    }

    #[test]
    fn test_shutdown_hook_sees_services() {
        struct Pool;

        let app = Application::builder()
            .service(Arc::new(Pool))
            .on_shutdown("pool", |services| {
                services
                    .resolve::<Pool>()
                    .map(|_| ())
                    .ok_or_else(|| anyhow::anyhow!("pool missing"))
            })
            .boot()
            .unwrap();

        assert!(app.shutdown().is_ok());
    }
}

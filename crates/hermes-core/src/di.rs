//! Service registry.
//!
//! Services are registered once while the application is built and are
//! shared for the life of the process. Handlers and controllers declare
//! service parameters with [`ParamSpec::service`](crate::ParamSpec::service);
//! the binder looks them up here by [`TypeId`].
//!
//! # Example
//!
//! ```rust
//! use hermes_core::di::ServiceRegistry;
//! use std::sync::Arc;
//!
//! struct Mailer {
//!     from: String,
//! }
//!
//! let mut services = ServiceRegistry::new();
//! services.register(Arc::new(Mailer { from: "noreply@example.com".into() }));
//!
//! let mailer: Arc<Mailer> = services.resolve().unwrap();
//! assert_eq!(mailer.from, "noreply@example.com");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DispatchError;

/// A shared, type-erased service instance.
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Process-lifetime mapping from type to singleton.
///
/// The registry is `Send + Sync` and read-only once the application boots.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, SharedService>,
}

impl ServiceRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers a singleton, replacing any earlier instance of the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a service by its [`TypeId`] without downcasting.
    #[must_use]
    pub fn resolve_by_id(&self, id: TypeId) -> Option<SharedService> {
        self.services.get(&id).cloned()
    }

    /// Resolves a service or returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerResolution`] if the service is not registered.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DispatchError> {
        self.resolve().ok_or_else(|| {
            DispatchError::handler_resolution(
                std::any::type_name::<T>(),
                "service not registered",
            )
        })
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Checks if a service is registered under `id`.
    #[must_use]
    pub fn contains_id(&self, id: TypeId) -> bool {
        self.services.contains_key(&id)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_count", &self.services.len())
            .finish()
    }
}

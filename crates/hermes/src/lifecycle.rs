//! Shutdown hooks.
//!
//! Hooks run when [`Application::shutdown`](crate::Application::shutdown) is
//! called, in reverse registration order. Every hook runs even if an earlier
//! one failed; the first failure is reported.

use std::fmt;

use hermes_core::ServiceRegistry;
use tracing::{error, info};

use crate::error::{ApplicationError, ApplicationResult};

/// A teardown callback with access to the registered services.
pub type ShutdownHook = Box<dyn FnOnce(&ServiceRegistry) -> anyhow::Result<()> + Send + Sync>;

/// Named shutdown hooks.
#[derive(Default)]
pub struct Lifecycle {
    shutdown_hooks: Vec<(String, ShutdownHook)>,
}

impl Lifecycle {
    /// Creates an empty lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shutdown hook.
    pub fn on_shutdown<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: FnOnce(&ServiceRegistry) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shutdown_hooks.push((name.into(), Box::new(hook)));
    }

    /// Number of registered shutdown hooks.
    #[must_use]
    pub fn shutdown_hook_count(&self) -> usize {
        self.shutdown_hooks.len()
    }

    /// Runs every shutdown hook in reverse order.
    pub(crate) fn run_shutdown(self, services: &ServiceRegistry) -> ApplicationResult<()> {
        let mut first_error = None;

        for (name, hook) in self.shutdown_hooks.into_iter().rev() {
            info!(hook = %name, "running shutdown hook");
            if let Err(source) = hook(services) {
                error!(hook = %name, error = %source, "shutdown hook failed");
                if first_error.is_none() {
                    first_error = Some(ApplicationError::ShutdownFailed { name, source });
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("shutdown_hooks", &self.shutdown_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_hooks_run_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();

        for name in ["db", "cache", "mailer"] {
            let order = Arc::clone(&order);
            lifecycle.on_shutdown(name, move |_| {
                order.lock().unwrap().push(name);
                Ok(())
            });
        }
        assert_eq!(lifecycle.shutdown_hook_count(), 3);

        lifecycle.run_shutdown(&ServiceRegistry::new()).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["mailer", "cache", "db"]);
    }

    #[test]
    fn test_failure_does_not_stop_later_hooks() {
        let ran = Arc::new(Mutex::new(false));
        let seen = Arc::clone(&ran);
        let mut lifecycle = Lifecycle::new();

        lifecycle.on_shutdown("last", move |_| {
            *seen.lock().unwrap() = true;
            Ok(())
        });
        lifecycle.on_shutdown("broken", |_| Err(anyhow::anyhow!("flush failed")));

        let err = lifecycle.run_shutdown(&ServiceRegistry::new()).unwrap_err();
        assert!(matches!(err, ApplicationError::ShutdownFailed { ref name, .. } if name == "broken"));
        assert!(*ran.lock().unwrap());
    }
}

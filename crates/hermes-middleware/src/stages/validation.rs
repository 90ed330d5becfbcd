//! Input validation stage.
//!
//! Runs a [`RuleSet`] against the context's input batch and stores the
//! [`ValidationOutcome`](hermes_core::ValidationOutcome) in the context. A
//! failed validation is not an error: the stage passes the context on and a
//! later stage or the handler decides what to do with `ctx.validation()`.
//! Unknown rule operations do propagate.
//!
//! Entities found by `unique` checks land in the context's binding cache,
//! where model binding can reuse them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hermes_core::RequestContext;
//! use hermes_middleware::{stages::ValidationStage, Middleware};
//! use hermes_validation::{RuleSet, Validator};
//! use serde_json::json;
//!
//! let stage = ValidationStage::new(
//!     "validate-signup",
//!     Arc::new(Validator::new()),
//!     RuleSet::new().field("name", ["required", "min:3"]),
//! );
//!
//! let ctx = RequestContext::mock().with_input([("name".to_string(), json!("al"))]);
//! let ctx = stage.handle(ctx).unwrap();
//! assert!(!ctx.validation().unwrap().passed());
//! ```

use std::fmt;
use std::sync::Arc;

use hermes_core::{DispatchError, RequestContext};
use hermes_validation::{RuleSet, Validator};
use serde_json::Value;
use tracing::debug;

use crate::middleware::Middleware;

/// Context attribute set to `false` when the stage recorded failures.
pub const VALID_ATTRIBUTE: &str = "validation.passed";

/// Middleware that validates the input batch.
#[derive(Clone)]
pub struct ValidationStage {
    name: String,
    validator: Arc<Validator>,
    rules: RuleSet,
}

impl ValidationStage {
    /// Creates a stage registered as `name`.
    pub fn new(name: impl Into<String>, validator: Arc<Validator>, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            validator,
            rules,
        }
    }

    /// The rule set this stage runs.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Middleware for ValidationStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, mut ctx: RequestContext) -> Result<RequestContext, DispatchError> {
        let outcome = self.validator.validate_context(&self.rules, &mut ctx)?;
        debug!(
            stage = %self.name,
            failed_fields = outcome.len(),
            "input validated"
        );
        ctx.set_attribute(VALID_ATTRIBUTE, Value::Bool(outcome.passed()));
        Ok(ctx)
    }
}

impl fmt::Debug for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationStage")
            .field("name", &self.name)
            .field("fields", &self.rules.fields().count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::MemoryPersistence;
    use serde_json::json;

    fn ctx_with(pairs: &[(&str, Value)]) -> RequestContext {
        RequestContext::mock()
            .with_input(pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())))
    }

    #[test]
    fn test_passing_input() {
        let stage = ValidationStage::new(
            "signup",
            Arc::new(Validator::new()),
            RuleSet::new().field("email", ["required", "regex:email"]),
        );

        let ctx = stage
            .handle(ctx_with(&[("email", json!("a@b.com"))]))
            .unwrap();
        assert!(ctx.validation().unwrap().passed());
        assert_eq!(ctx.attribute(VALID_ATTRIBUTE), Some(&json!(true)));
    }

    #[test]
    fn test_failure_is_recorded_not_raised() {
        let stage = ValidationStage::new(
            "signup",
            Arc::new(Validator::new()),
            RuleSet::new().field("email", ["required", "regex:email"]),
        );

        let ctx = stage
            .handle(ctx_with(&[("email", json!("not-an-email"))]))
            .unwrap();
        let outcome = ctx.validation().unwrap();
        assert!(outcome.message("email").is_some());
        assert_eq!(ctx.attribute(VALID_ATTRIBUTE), Some(&json!(false)));
    }

    #[test]
    fn test_unknown_rule_propagates() {
        let stage = ValidationStage::new(
            "signup",
            Arc::new(Validator::new()),
            RuleSet::new().field("name", ["shiny"]),
        );

        let err = stage.handle(ctx_with(&[("name", json!("x"))])).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownValidationRule { .. }));
    }

    #[test]
    fn test_unique_match_lands_in_binding_cache() {
        let mut store = MemoryPersistence::new();
        store.insert("user", "id", json!({"id": 1, "email": "ada@example.com"}));
        let validator = Validator::new().with_persistence(Arc::new(store));

        let stage = ValidationStage::new(
            "exists",
            Arc::new(validator),
            RuleSet::new().field("email", ["!unique:user:email"]),
        );

        let ctx = stage
            .handle(ctx_with(&[("email", json!("ada@example.com"))]))
            .unwrap();
        assert!(ctx.validation().unwrap().passed());
        assert!(ctx.bindings().get("user", "user").is_some());
    }
}

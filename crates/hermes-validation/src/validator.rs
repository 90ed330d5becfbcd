//! Rule evaluation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hermes_core::{
    coerce, to_text, BindingCache, DispatchError, Persistence, RequestContext, ValidationOutcome,
};
use hermes_telemetry::metrics::record_validation_failure;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::operation::{builtin, Operation, OperationCall};
use crate::pattern::PatternBook;
use crate::rule::{RuleArg, RuleInvocation, RuleSet};

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("required", ":attribute is required"),
    ("regex", ":attribute format is invalid"),
    ("min", ":attribute must be at least :min characters"),
    ("max", ":attribute may not be longer than :max characters"),
    ("min_num", ":attribute must be at least :min"),
    ("max_num", ":attribute may not be greater than :max"),
    ("same", ":attribute must match :other"),
    ("!same", ":attribute must be different from :other"),
    ("unique", ":attribute has already been taken"),
    ("!unique", "the selected :attribute is invalid"),
];

/// The validation rule engine.
///
/// Holds the operation table, the global named patterns, the global message
/// templates and an optional persistence collaborator for `unique`. Built at
/// boot and shared read-only afterwards.
///
/// # Example
///
/// ```
/// use hermes_core::BindingCache;
/// use hermes_validation::{RuleSet, Validator};
/// use indexmap::IndexMap;
/// use serde_json::json;
///
/// let validator = Validator::new();
/// let rules = RuleSet::new().field("email", ["required", "regex:email"]);
///
/// let mut input = IndexMap::new();
/// input.insert("email".to_string(), json!("not-an-email"));
///
/// let outcome = validator.validate(&rules, &input, &mut BindingCache::new()).unwrap();
/// assert_eq!(outcome.message("email"), Some("email must be a valid email address"));
/// ```
#[derive(Clone)]
pub struct Validator {
    operations: HashMap<String, Operation>,
    patterns: PatternBook,
    messages: HashMap<String, String>,
    persistence: Option<Arc<dyn Persistence>>,
}

impl Validator {
    /// Creates a validator with the built-in operations, patterns and messages.
    #[must_use]
    pub fn new() -> Self {
        let operations = builtin()
            .into_iter()
            .map(|op| (op.name().to_string(), op))
            .collect();
        let messages = DEFAULT_MESSAGES
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            operations,
            patterns: PatternBook::builtin(),
            messages,
            persistence: None,
        }
    }

    /// Adds or replaces an operation.
    pub fn register(&mut self, operation: Operation) -> ValidationResult<()> {
        if operation.name().is_empty() {
            return Err(ValidationError::EmptyOperationName);
        }
        self.operations
            .insert(operation.name().to_string(), operation);
        Ok(())
    }

    /// Adds or replaces a global named pattern.
    pub fn add_pattern(
        &mut self,
        name: impl Into<String>,
        source: &str,
        message: Option<String>,
    ) -> ValidationResult<()> {
        self.patterns.insert(name, source, message)
    }

    /// Overrides the global message template for an operation.
    pub fn set_message(&mut self, operation: impl Into<String>, template: impl Into<String>) {
        self.messages.insert(operation.into(), template.into());
    }

    /// Sets the persistence collaborator used by `unique`.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Sets the persistence collaborator used by `unique`.
    pub fn set_persistence(&mut self, persistence: Arc<dyn Persistence>) {
        self.persistence = Some(persistence);
    }

    /// True when an operation with this name is registered.
    #[must_use]
    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Validates an input batch.
    ///
    /// Every rule of every field is evaluated. A failing rule records its
    /// message under the field, replacing any earlier one, so the last
    /// failure wins.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownValidationRule`] for unknown operations
    /// or pattern names, and propagates persistence failures.
    pub fn validate(
        &self,
        rules: &RuleSet,
        input: &IndexMap<String, Value>,
        bindings: &mut BindingCache,
    ) -> Result<ValidationOutcome, DispatchError> {
        let mut outcome = ValidationOutcome::new();

        for (field, invocations) in rules.fields() {
            let value = input.get(field).unwrap_or(&Value::Null);

            if invocations.iter().any(RuleInvocation::is_nullable)
                && to_text(value).trim().is_empty()
            {
                debug!(field, "nullable field is empty, skipping rules");
                continue;
            }

            for rule in invocations {
                if let Some(message) = self.evaluate(rules, field, value, rule, input, bindings)? {
                    debug!(field, rule = rule.token(), "validation rule failed");
                    record_validation_failure(field);
                    outcome.record(field, message);
                }
            }
        }

        Ok(outcome)
    }

    /// Validates the context's input batch, sharing its binding cache, and
    /// stores the outcome in the context.
    pub fn validate_context(
        &self,
        rules: &RuleSet,
        ctx: &mut RequestContext,
    ) -> Result<ValidationOutcome, DispatchError> {
        let (input, bindings) = ctx.input_and_bindings_mut();
        let outcome = self.validate(rules, input, bindings)?;
        ctx.set_validation(outcome.clone());
        Ok(outcome)
    }

    /// Runs one rule; `Some(message)` when it failed.
    fn evaluate(
        &self,
        rules: &RuleSet,
        field: &str,
        value: &Value,
        rule: &RuleInvocation,
        input: &IndexMap<String, Value>,
        bindings: &mut BindingCache,
    ) -> Result<Option<String>, DispatchError> {
        let operation = self
            .operations
            .get(rule.operation())
            .ok_or_else(|| DispatchError::unknown_rule(field, rule.token()))?;

        let args: Vec<Value> = rule
            .args()
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let raw = match arg {
                    RuleArg::Literal(text) => Value::String(text.clone()),
                    RuleArg::Field(name) => input.get(name).cloned().unwrap_or(Value::Null),
                };
                coerce(raw, operation.param_type(i))
            })
            .collect();

        let mut call = OperationCall {
            field,
            token: rule.token(),
            value,
            args,
            bindings,
            persistence: self.persistence.as_deref(),
            local_patterns: rules.patterns(),
            global_patterns: &self.patterns,
        };

        let passed = operation.check(&mut call)? != rule.negated();
        if passed {
            return Ok(None);
        }

        let template = self.template_for(rules, field, rule, &call);
        Ok(Some(render(template.as_deref(), field, rule, operation, &call.args)))
    }

    fn template_for(
        &self,
        rules: &RuleSet,
        field: &str,
        rule: &RuleInvocation,
        call: &OperationCall<'_>,
    ) -> Option<String> {
        if let Some(custom) = rules.message_for(field, rule) {
            return Some(custom.to_string());
        }
        if rule.operation() == "regex" && !rule.negated() {
            let from_pattern = call
                .pattern(&to_text(call.arg(0)))
                .and_then(|p| p.message());
            if let Some(message) = from_pattern {
                return Some(message.to_string());
            }
        }
        let key = if rule.negated() {
            format!("!{}", rule.operation())
        } else {
            rule.operation().to_string()
        };
        self.messages.get(&key).cloned()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("operations", &self.operations.len())
            .field("patterns", &self.patterns.len())
            .field("persistence", &self.persistence.is_some())
            .finish()
    }
}

/// Fills placeholders in a template, or synthesizes a message.
///
/// `:attribute` is the field. Each declared parameter name (`:min`, `:max`,
/// `:other`) is its argument: a referenced field's name for `@field`
/// arguments, otherwise the coerced literal. `:param` aliases the first one.
fn render(
    template: Option<&str>,
    field: &str,
    rule: &RuleInvocation,
    operation: &Operation,
    args: &[Value],
) -> String {
    let Some(template) = template else {
        return format!(
            "{field} failed {} validation rule",
            rule.operation().replace('_', " ")
        );
    };

    let resolved: Vec<String> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| match rule.args().get(i) {
            Some(RuleArg::Field(name)) => name.clone(),
            _ => to_text(arg),
        })
        .collect();

    let mut placeholders: Vec<(&str, &str)> = vec![("attribute", field)];
    placeholders.extend(resolved.first().map(|first| ("param", first.as_str())));
    placeholders.extend(
        resolved
            .iter()
            .enumerate()
            .filter_map(|(i, text)| Some((operation.param_name(i)?, text.as_str()))),
    );
    fill(template, &placeholders)
}

/// Replaces each `:word` that names a placeholder. Words run over ASCII
/// alphanumerics and `_`, so `:min` never matches inside `:minimum`.
fn fill(template: &str, placeholders: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find(':') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let word = &after[..len];
        match placeholders.iter().find(|(name, _)| !word.is_empty() && *name == word) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push(':');
                out.push_str(word);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

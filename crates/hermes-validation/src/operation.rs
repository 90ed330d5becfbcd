//! The operation capability table.
//!
//! Every rule name maps to an [`Operation`]: the names and scalar types of
//! its arguments and a predicate. Parameter names double as message
//! placeholders, so `min` renders `:min`. Arguments are coerced to the declared types
//! before the predicate runs; arguments beyond the declared list are passed
//! unconverted.

use std::fmt;
use std::sync::Arc;

use hermes_core::{as_number, to_text, BindingCache, DispatchError, Persistence, ScalarType};
use serde_json::Value;

use crate::pattern::{NamedPattern, PatternBook};
use crate::rule::{NULLABLE, UNIQUE};

/// Predicate signature of an operation.
pub type OperationFn =
    Arc<dyn for<'a> Fn(&mut OperationCall<'a>) -> Result<bool, DispatchError> + Send + Sync>;

/// A named predicate with typed arguments.
#[derive(Clone)]
pub struct Operation {
    name: String,
    params: Vec<(&'static str, ScalarType)>,
    check: OperationFn,
}

impl Operation {
    /// Creates an operation.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::ScalarType;
    /// use hermes_validation::Operation;
    ///
    /// let even = Operation::new("even", vec![], |call| {
    ///     Ok(call.value().as_i64().is_some_and(|n| n % 2 == 0))
    /// });
    /// assert_eq!(even.name(), "even");
    ///
    /// let between = Operation::new(
    ///     "between",
    ///     vec![("min", ScalarType::Int), ("max", ScalarType::Int)],
    ///     |call| {
    ///         let bounds = (call.value().as_i64(), call.arg(0).as_i64(), call.arg(1).as_i64());
    ///         Ok(matches!(bounds, (Some(n), Some(lo), Some(hi)) if lo <= n && n <= hi))
    ///     },
    /// );
    /// assert_eq!(between.param_name(1), Some("max"));
    /// ```
    pub fn new<F>(
        name: impl Into<String>,
        params: Vec<(&'static str, ScalarType)>,
        check: F,
    ) -> Self
    where
        F: for<'a> Fn(&mut OperationCall<'a>) -> Result<bool, DispatchError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            check: Arc::new(check),
        }
    }

    /// The rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments as `(name, type)` pairs.
    #[must_use]
    pub fn params(&self) -> &[(&'static str, ScalarType)] {
        &self.params
    }

    /// Declared name of argument `index`.
    #[must_use]
    pub fn param_name(&self, index: usize) -> Option<&'static str> {
        self.params.get(index).map(|(name, _)| *name)
    }

    /// Declared type of argument `index`. Undeclared positions take any value.
    #[must_use]
    pub fn param_type(&self, index: usize) -> ScalarType {
        self.params.get(index).map(|(_, ty)| *ty).unwrap_or_default()
    }

    /// Runs the predicate.
    pub fn check(&self, call: &mut OperationCall<'_>) -> Result<bool, DispatchError> {
        (self.check)(call)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Everything a predicate can see.
pub struct OperationCall<'a> {
    pub(crate) field: &'a str,
    pub(crate) token: &'a str,
    pub(crate) value: &'a Value,
    pub(crate) args: Vec<Value>,
    pub(crate) bindings: &'a mut BindingCache,
    pub(crate) persistence: Option<&'a dyn Persistence>,
    pub(crate) local_patterns: &'a PatternBook,
    pub(crate) global_patterns: &'a PatternBook,
}

impl<'a> OperationCall<'a> {
    /// The field under validation.
    #[must_use]
    pub fn field(&self) -> &'a str {
        self.field
    }

    /// The rule token as written.
    #[must_use]
    pub fn token(&self) -> &'a str {
        self.token
    }

    /// The field's input value. Missing fields read as null.
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The coerced arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// One coerced argument, null when absent.
    #[must_use]
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&Value::Null)
    }

    /// The request's binding cache.
    pub fn bindings(&mut self) -> &mut BindingCache {
        &mut *self.bindings
    }

    /// The persistence collaborator, if the validator has one.
    #[must_use]
    pub fn persistence(&self) -> Option<&'a dyn Persistence> {
        self.persistence
    }

    /// A named pattern, rule-set patterns first.
    #[must_use]
    pub fn pattern(&self, name: &str) -> Option<&'a NamedPattern> {
        self.local_patterns
            .get(name)
            .or_else(|| self.global_patterns.get(name))
    }

    fn unknown(&self) -> DispatchError {
        DispatchError::unknown_rule(self.field, self.token)
    }
}

/// The built-in operations.
#[must_use]
pub fn builtin() -> Vec<Operation> {
    vec![
        Operation::new("required", vec![], |call| Ok(is_present(call.value()))),
        Operation::new(NULLABLE, vec![], |_| Ok(true)),
        Operation::new("regex", vec![("pattern", ScalarType::String)], |call| {
            let name = to_text(call.arg(0));
            let pattern = call.pattern(&name).ok_or_else(|| call.unknown())?;
            Ok(pattern.is_match(&to_text(call.value())))
        }),
        Operation::new("min", vec![("min", ScalarType::Int)], |call| {
            let len = char_len(call.value());
            Ok(call.arg(0).as_i64().is_some_and(|min| len >= min))
        }),
        Operation::new("max", vec![("max", ScalarType::Int)], |call| {
            let len = char_len(call.value());
            Ok(call.arg(0).as_i64().is_some_and(|max| len <= max))
        }),
        Operation::new("min_num", vec![("min", ScalarType::Float)], |call| {
            Ok(compare_numeric(call.value(), call.arg(0), |v, n| v >= n))
        }),
        Operation::new("max_num", vec![("max", ScalarType::Float)], |call| {
            Ok(compare_numeric(call.value(), call.arg(0), |v, n| v <= n))
        }),
        Operation::new("same", vec![("other", ScalarType::Any)], |call| {
            Ok(loosely_equal(call.value(), call.arg(0)))
        }),
        Operation::new(
            UNIQUE,
            vec![
                ("entity", ScalarType::String),
                ("column", ScalarType::String),
                ("field", ScalarType::String),
            ],
            unique,
        ),
    ]
}

/// `unique:<entity>[:<column>]`, with the field name appended at parse time.
///
/// Passes when no `<entity>` has `<column>` equal to the value. A found
/// entity is stored in the binding cache under the slot `<entity>`, so a
/// negated rule (`!unique`, an existence check) leaves the entity ready for
/// model binding.
fn unique(call: &mut OperationCall<'_>) -> Result<bool, DispatchError> {
    let entity = to_text(call.arg(0));
    // With the column omitted the appended field name stands in for it.
    if call.args().len() < 2 {
        return Err(call.unknown());
    }
    let column = to_text(call.arg(1));
    if entity.is_empty() || column.is_empty() {
        return Err(call.unknown());
    }

    let persistence = call.persistence().ok_or_else(|| {
        DispatchError::handler_resolution(call.token(), "no persistence collaborator for unique")
    })?;

    match persistence.find_one(&entity, &column, call.value())? {
        Some(found) => {
            tracing::debug!(field = call.field(), entity = %entity, "unique lookup matched");
            call.bindings().insert(entity, found);
            Ok(false)
        }
        None => Ok(true),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn char_len(value: &Value) -> i64 {
    i64::try_from(to_text(value).chars().count()).unwrap_or(i64::MAX)
}

fn compare_numeric(value: &Value, bound: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(value), bound.as_f64()) {
        (Some(v), Some(n)) => cmp(v, n),
        _ => false,
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => a == b || to_text(a) == to_text(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_present() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!("   ")));
        assert!(!is_present(&json!([])));
        assert!(is_present(&json!(0)));
        assert!(is_present(&json!("x")));
    }

    #[test]
    fn test_compare_numeric_rejects_text() {
        assert!(!compare_numeric(&json!("abc"), &json!(5.0), |v, n| v >= n));
        assert!(compare_numeric(&json!("7"), &json!(5.0), |v, n| v >= n));
    }

    #[test]
    fn test_loosely_equal() {
        assert!(loosely_equal(&json!("5"), &json!(5)));
        assert!(loosely_equal(&Value::Null, &Value::Null));
        assert!(!loosely_equal(&json!(""), &Value::Null));
        assert!(!loosely_equal(&json!("a"), &json!("b")));
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let ops = builtin();
        let mut names: Vec<_> = ops.iter().map(Operation::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ops.len());
    }

    #[test]
    fn test_param_names_and_types() {
        let ops = builtin();
        let unique = ops.iter().find(|op| op.name() == UNIQUE).unwrap();
        assert_eq!(unique.param_name(0), Some("entity"));
        assert_eq!(unique.param_name(2), Some("field"));
        assert_eq!(unique.param_name(3), None);
        assert_eq!(unique.param_type(1), ScalarType::String);
        assert_eq!(unique.param_type(3), ScalarType::default());
    }
}

//! Scalar coercion.
//!
//! Captured route variables and CLI tokens arrive as strings. Handler
//! parameters and validation operations declare a [`ScalarType`], and
//! [`coerce`] converts raw values to it with one fixed table:
//!
//! | Target | Strings | Numbers | Booleans | Null |
//! |---|---|---|---|---|
//! | `Int` | parsed, float text truncated, else `0` | truncated | `1`/`0` | null |
//! | `Float` | parsed, else `0.0` | widened | `1.0`/`0.0` | null |
//! | `Bool` | false for `""`, `0`, `false`, `off`, `no` | non-zero | unchanged | null |
//! | `String` | unchanged | decimal text | `true`/`false` | null |
//! | `Array` | wrapped in a one-element array | wrapped | wrapped | null |
//! | `Any` | unchanged | unchanged | unchanged | null |
//!
//! Arrays and objects are only converted by `Array` (arrays unchanged,
//! objects become their values) and `String` (JSON text).

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Declared scalar type of a handler parameter or operation argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Raw array.
    Array,
    /// No conversion.
    #[default]
    Any,
}

/// Coerces a raw value to `ty`.
///
/// # Example
///
/// ```
/// use hermes_core::{coerce, ScalarType};
/// use serde_json::json;
///
/// assert_eq!(coerce(json!("42"), ScalarType::Int), json!(42));
/// assert_eq!(coerce(json!("off"), ScalarType::Bool), json!(false));
/// assert_eq!(coerce(json!(3), ScalarType::String), json!("3"));
/// ```
#[must_use]
pub fn coerce(value: Value, ty: ScalarType) -> Value {
    if value.is_null() {
        return value;
    }
    match ty {
        ScalarType::Int => Value::from(to_int(&value)),
        ScalarType::Float => Number::from_f64(to_float(&value)).map_or(Value::Null, Value::Number),
        ScalarType::Bool => Value::Bool(to_bool(&value)),
        ScalarType::String => Value::String(to_text(&value)),
        ScalarType::Array => match value {
            Value::Array(_) => value,
            Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
            other => Value::Array(vec![other]),
        },
        ScalarType::Any => value,
    }
}

/// True for numbers and for strings that parse as a number.
#[must_use]
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

/// Numeric reading of a value, if it has one.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Text reading of a value. Null reads as the empty string.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn to_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or_default()
        }
        Value::Bool(b) => i64::from(*b),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
        Value::Null => 0,
    }
}

fn to_float(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => as_number(value).unwrap_or_default(),
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty()
                || s == "0"
                || s.eq_ignore_ascii_case("false")
                || s.eq_ignore_ascii_case("off")
                || s.eq_ignore_ascii_case("no"))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce(json!("42"), ScalarType::Int), json!(42));
        assert_eq!(coerce(json!(" -7 "), ScalarType::Int), json!(-7));
        assert_eq!(coerce(json!("3.9"), ScalarType::Int), json!(3));
        assert_eq!(coerce(json!("abc"), ScalarType::Int), json!(0));
        assert_eq!(coerce(json!(true), ScalarType::Int), json!(1));
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce(json!("2.5"), ScalarType::Float), json!(2.5));
        assert_eq!(coerce(json!(2), ScalarType::Float), json!(2.0));
        assert_eq!(coerce(json!("x"), ScalarType::Float), json!(0.0));
    }

    #[test]
    fn test_coerce_bool() {
        for falsy in ["", "0", "false", "FALSE", "off", "no"] {
            assert_eq!(coerce(json!(falsy), ScalarType::Bool), json!(false), "{falsy}");
        }
        for truthy in ["1", "true", "yes", "on", "anything"] {
            assert_eq!(coerce(json!(truthy), ScalarType::Bool), json!(true), "{truthy}");
        }
        assert_eq!(coerce(json!(0), ScalarType::Bool), json!(false));
    }

    #[test]
    fn test_coerce_string_and_array() {
        assert_eq!(coerce(json!(12), ScalarType::String), json!("12"));
        assert_eq!(coerce(json!(false), ScalarType::String), json!("false"));
        assert_eq!(coerce(json!("a"), ScalarType::Array), json!(["a"]));
        assert_eq!(coerce(json!([1, 2]), ScalarType::Array), json!([1, 2]));
    }

    #[test]
    fn test_null_and_any_pass_through() {
        assert_eq!(coerce(Value::Null, ScalarType::Int), Value::Null);
        assert_eq!(coerce(json!({"a": 1}), ScalarType::Any), json!({"a": 1}));
    }

    proptest::proptest! {
        #[test]
        fn prop_integer_text_coerces_exactly(n in proptest::num::i64::ANY) {
            proptest::prop_assert_eq!(coerce(json!(n.to_string()), ScalarType::Int), json!(n));
        }

        #[test]
        fn prop_coercion_is_idempotent(s in ".{0,12}") {
            for ty in [ScalarType::Int, ScalarType::Bool, ScalarType::String, ScalarType::Array] {
                let once = coerce(json!(s.clone()), ty);
                proptest::prop_assert_eq!(coerce(once.clone(), ty), once);
            }
        }
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric(&json!("5")));
        assert!(is_numeric(&json!(" 5.5 ")));
        assert!(is_numeric(&json!(3)));
        assert!(!is_numeric(&json!("abc")));
        assert!(!is_numeric(&json!("NaN")));
        assert!(!is_numeric(&Value::Null));
    }
}

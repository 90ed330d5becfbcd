//! # Hermes Validation
//!
//! Rule-token validation for input batches.
//!
//! A [`RuleSet`] maps fields to rule tokens such as `required`, `min:5`,
//! `regex:email` or `!same:@password`. The tokens are parsed once into
//! [`RuleInvocation`]s. A [`Validator`] evaluates them through its
//! [`Operation`] table and produces a [`ValidationOutcome`]: one message per
//! failed field, empty when everything passed.
//!
//! ## Rule tokens
//!
//! | Token | Meaning |
//! |---|---|
//! | `required` | present and not blank |
//! | `nullable` | skip the field's other rules when it is blank |
//! | `regex:<name>` | matches a named pattern (rule-set patterns shadow global ones) |
//! | `min:<n>` / `max:<n>` | length in characters |
//! | `min_num:<n>` / `max_num:<n>` | numeric bound, non-numeric input fails |
//! | `same:<value>` | equal to a literal or to `@field` |
//! | `unique:<entity>[:<column>]` | no stored entity has this value |
//!
//! A leading `!` inverts any rule. Unknown operations are a hard
//! [`DispatchError::UnknownValidationRule`](hermes_core::DispatchError::UnknownValidationRule).

#![doc(html_root_url = "https://docs.rs/hermes-validation/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod operation;
mod pattern;
mod rule;
mod validator;

pub use error::{ValidationError, ValidationResult};
pub use hermes_core::ValidationOutcome;
pub use operation::{Operation, OperationCall, OperationFn};
pub use pattern::{NamedPattern, PatternBook};
pub use rule::{RuleArg, RuleInvocation, RuleSet, NULLABLE, UNIQUE};
pub use validator::Validator;

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::BindingCache;
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn prop_min_passes_iff_long_enough(text in "\\PC{0,12}", min in 0usize..12) {
            let rules = RuleSet::new().field("f", [format!("min:{min}")]);
            let mut input = IndexMap::new();
            input.insert("f".to_string(), json!(text.clone()));

            let outcome = Validator::new()
                .validate(&rules, &input, &mut BindingCache::new())
                .unwrap();
            prop_assert_eq!(outcome.passed(), text.chars().count() >= min);
        }

        #[test]
        fn prop_negation_inverts(a in "[a-c]{1,2}", b in "[a-c]{1,2}") {
            let mut input = IndexMap::new();
            input.insert("a".to_string(), json!(a.clone()));
            input.insert("b".to_string(), json!(b.clone()));
            let validator = Validator::new();

            let same = RuleSet::new().field("a", ["same:@b"]);
            let different = RuleSet::new().field("a", ["!same:@b"]);
            let same_ok = validator.validate(&same, &input, &mut BindingCache::new()).unwrap().passed();
            let different_ok = validator.validate(&different, &input, &mut BindingCache::new()).unwrap().passed();

            prop_assert_eq!(same_ok, a == b);
            prop_assert_eq!(same_ok, !different_ok);
        }
    }
}

//! Rule tokens and rule sets.
//!
//! A rule token is `[!]operation[:arg[:arg...]]`. A leading `!` negates the
//! result, and an argument written `@other` refers to another field of the
//! same input batch. Tokens are parsed once, when the rule set is built.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::ValidationResult;
use crate::pattern::PatternBook;

/// The `nullable` flag.
pub const NULLABLE: &str = "nullable";
/// The `unique` operation, which receives the field name as its last argument.
pub const UNIQUE: &str = "unique";

/// One argument of a rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleArg {
    /// Literal text from the token.
    Literal(String),
    /// A reference to another input field (`@name`).
    Field(String),
}

/// A parsed rule token.
///
/// # Example
///
/// ```
/// use hermes_validation::{RuleArg, RuleInvocation};
///
/// let rule = RuleInvocation::parse("confirm", "!same:@password");
/// assert!(rule.negated());
/// assert_eq!(rule.operation(), "same");
/// assert_eq!(rule.args(), &[RuleArg::Field("password".into())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInvocation {
    token: String,
    negated: bool,
    operation: String,
    args: Vec<RuleArg>,
}

impl RuleInvocation {
    /// Parses `token` as written for `field`.
    #[must_use]
    pub fn parse(field: &str, token: &str) -> Self {
        let trimmed = token.trim();
        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut parts = body.split(':');
        let operation = parts.next().unwrap_or_default().to_string();
        let mut args: Vec<RuleArg> = parts
            .map(|arg| match arg.strip_prefix('@') {
                Some(name) => RuleArg::Field(name.to_string()),
                None => RuleArg::Literal(arg.to_string()),
            })
            .collect();

        if operation == UNIQUE {
            args.push(RuleArg::Literal(field.to_string()));
        }

        Self {
            token: trimmed.to_string(),
            negated,
            operation,
            args,
        }
    }

    /// The token as written.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// True when the result is inverted.
    #[must_use]
    pub const fn negated(&self) -> bool {
        self.negated
    }

    /// The operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The parsed arguments.
    #[must_use]
    pub fn args(&self) -> &[RuleArg] {
        &self.args
    }

    /// True for the `nullable` flag.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.operation == NULLABLE && !self.negated
    }
}

/// Per-field rules plus rule-set specific messages and patterns.
///
/// # Example
///
/// ```
/// use hermes_validation::RuleSet;
///
/// let rules = RuleSet::new()
///     .field("email", ["required", "regex:email"])
///     .field("name", ["nullable", "min:2"])
///     .message("required", ":attribute cannot be blank");
///
/// assert_eq!(rules.fields().count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: IndexMap<String, Vec<RuleInvocation>>,
    messages: HashMap<String, String>,
    patterns: PatternBook,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rules for `field`, replacing earlier ones.
    #[must_use]
    pub fn field<I, S>(mut self, field: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field = field.into();
        let rules = tokens
            .into_iter()
            .map(|t| RuleInvocation::parse(&field, t.as_ref()))
            .collect();
        self.fields.insert(field, rules);
        self
    }

    /// Sets the rules for `field` from a `|`-separated string.
    #[must_use]
    pub fn field_str(self, field: impl Into<String>, rules: &str) -> Self {
        self.field(field, rules.split('|').filter(|t| !t.trim().is_empty()))
    }

    /// Sets a message template for an operation. The key is either the
    /// operation name (`min`) or a field-qualified name (`email.min`).
    /// Prefix the operation with `!` to target its negated form.
    #[must_use]
    pub fn message(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    /// Adds a pattern visible only to this rule set.
    pub fn pattern(
        mut self,
        name: impl Into<String>,
        source: &str,
        message: Option<String>,
    ) -> ValidationResult<Self> {
        self.patterns.insert(name, source, message)?;
        Ok(self)
    }

    /// Fields with their parsed rules, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[RuleInvocation])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// The rules of one field.
    #[must_use]
    pub fn rules_for(&self, field: &str) -> Option<&[RuleInvocation]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// The custom template for `rule` on `field`, most specific first.
    #[must_use]
    pub fn message_for(&self, field: &str, rule: &RuleInvocation) -> Option<&str> {
        let op = if rule.negated() {
            format!("!{}", rule.operation())
        } else {
            rule.operation().to_string()
        };
        self.messages
            .get(&format!("{field}.{op}"))
            .or_else(|| self.messages.get(&op))
            .map(String::as_str)
    }

    /// Patterns added to this rule set.
    #[must_use]
    pub const fn patterns(&self) -> &PatternBook {
        &self.patterns
    }

    /// True when no field has rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let rule = RuleInvocation::parse("name", "min:5");
        assert!(!rule.negated());
        assert_eq!(rule.operation(), "min");
        assert_eq!(rule.args(), &[RuleArg::Literal("5".into())]);
    }

    #[test]
    fn test_parse_without_args() {
        let rule = RuleInvocation::parse("name", "required");
        assert_eq!(rule.operation(), "required");
        assert!(rule.args().is_empty());
    }

    #[test]
    fn test_parse_unique_appends_field() {
        let rule = RuleInvocation::parse("email", "unique:user:email");
        assert_eq!(
            rule.args(),
            &[
                RuleArg::Literal("user".into()),
                RuleArg::Literal("email".into()),
                RuleArg::Literal("email".into()),
            ]
        );
    }

    #[test]
    fn test_parse_negated_nullable_is_not_flag() {
        assert!(RuleInvocation::parse("x", "nullable").is_nullable());
        assert!(!RuleInvocation::parse("x", "!nullable").is_nullable());
    }

    #[test]
    fn test_field_str_splits_pipes() {
        let rules = RuleSet::new().field_str("email", "required|regex:email|");
        let parsed = rules.rules_for("email").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].operation(), "regex");
    }

    #[test]
    fn test_message_lookup_prefers_field_specific() {
        let rules = RuleSet::new()
            .field("email", ["required"])
            .message("required", "generic")
            .message("email.required", "specific");
        let rule = &rules.rules_for("email").unwrap()[0];
        assert_eq!(rules.message_for("email", rule), Some("specific"));
        assert_eq!(rules.message_for("name", rule), Some("generic"));
    }

    #[test]
    fn test_message_lookup_negated() {
        let rules = RuleSet::new()
            .field("confirm", ["!same:@password"])
            .message("!same", ":attribute must differ");
        let rule = &rules.rules_for("confirm").unwrap()[0];
        assert_eq!(rules.message_for("confirm", rule), Some(":attribute must differ"));
    }
}

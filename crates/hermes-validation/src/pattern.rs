//! Named regular expressions for the `regex:<name>` rule.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{ValidationError, ValidationResult};

/// A compiled pattern with an optional failure message.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    regex: Regex,
    message: Option<String>,
}

impl NamedPattern {
    /// Compiles `source`.
    pub fn new(name: &str, source: &str, message: Option<String>) -> ValidationResult<Self> {
        let regex = Regex::new(source).map_err(|e| ValidationError::invalid_pattern(name, e))?;
        Ok(Self { regex, message })
    }

    /// True when `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The message template used when the pattern does not match.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A set of named patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternBook {
    patterns: HashMap<String, NamedPattern>,
}

impl PatternBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The patterns every validator starts with.
    #[must_use]
    pub fn builtin() -> Self {
        let mut book = Self::new();
        for (name, source, message) in BUILTIN_PATTERNS {
            // Built-in sources are fixed and known to compile.
            if let Ok(pattern) = NamedPattern::new(name, source, Some((*message).to_string())) {
                book.patterns.insert((*name).to_string(), pattern);
            }
        }
        book
    }

    /// Adds or replaces a pattern.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        source: &str,
        message: Option<String>,
    ) -> ValidationResult<()> {
        let name = name.into();
        let pattern = NamedPattern::new(&name, source, message)?;
        self.patterns.insert(name, pattern);
        Ok(())
    }

    /// Looks up a pattern.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedPattern> {
        self.patterns.get(name)
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

const BUILTIN_PATTERNS: &[(&str, &str, &str)] = &[
    (
        "email",
        r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$",
        ":attribute must be a valid email address",
    ),
    ("alpha", r"^[A-Za-z]+$", ":attribute may only contain letters"),
    (
        "alpha_num",
        r"^[A-Za-z0-9]+$",
        ":attribute may only contain letters and numbers",
    ),
    ("numeric", r"^-?[0-9]+(\.[0-9]+)?$", ":attribute must be a number"),
    (
        "url",
        r"^https?://[^\s/$.?#][^\s]*$",
        ":attribute must be a valid URL",
    ),
    (
        "uuid",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        ":attribute must be a valid UUID",
    ),
    (
        "slug",
        r"^[a-z0-9]+(?:-[a-z0-9]+)*$",
        ":attribute may only contain lowercase letters, numbers and dashes",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        let book = PatternBook::builtin();
        assert_eq!(book.len(), BUILTIN_PATTERNS.len());
    }

    #[test]
    fn test_builtin_email() {
        let book = PatternBook::builtin();
        let email = book.get("email").unwrap();
        assert!(email.is_match("a@b.com"));
        assert!(!email.is_match("not-an-email"));
        assert!(email.message().unwrap().contains("email"));
    }

    #[test]
    fn test_builtin_slug_and_uuid() {
        let book = PatternBook::builtin();
        assert!(book.get("slug").unwrap().is_match("hello-world-2"));
        assert!(!book.get("slug").unwrap().is_match("Hello World"));
        assert!(book
            .get("uuid")
            .unwrap()
            .is_match("0190a6f2-8c2e-7d3b-9a41-5b2f3c4d5e6f"));
    }

    #[test]
    fn test_insert_rejects_bad_regex() {
        let mut book = PatternBook::new();
        let err = book.insert("broken", "(unclosed", None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPattern { ref name, .. } if name == "broken"));
    }
}

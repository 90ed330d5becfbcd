//! Route pattern compilation.
//!
//! A pattern such as `/users/{user}/posts` or `make:migration {name}` is
//! compiled once, at registration time, into an ordered list of
//! [`Segment`]s. Matching is then a segment-by-segment comparison against
//! the tokenized input.

use std::collections::HashSet;

use thiserror::Error;

use crate::kind::RequestKind;
use crate::params::Captures;

/// Errors raised while compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{}` segment with no variable name.
    #[error("empty variable name in pattern '{pattern}'")]
    EmptyVariable {
        /// The offending pattern.
        pattern: String,
    },

    /// A variable name used more than once in the same pattern.
    #[error("duplicate variable '{name}' in pattern '{pattern}'")]
    DuplicateVariable {
        /// The offending pattern.
        pattern: String,
        /// The repeated variable name.
        name: String,
    },

    /// A segment mixing literal text and braces, e.g. `user-{id}`, or a web
    /// segment carrying a query string, e.g. `users?active=1`.
    #[error("malformed segment '{segment}' in pattern '{pattern}'")]
    MalformedSegment {
        /// The offending pattern.
        pattern: String,
        /// The segment that could not be compiled.
        segment: String,
    },
}

/// One compiled token of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the input token exactly.
    Literal(String),
    /// Captures exactly one input token under this name.
    Variable(String),
}

impl Segment {
    /// Returns the variable name, if this is a variable segment.
    #[must_use]
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

/// A compiled route pattern.
///
/// # Example
///
/// ```rust
/// use hermes_router::{Pattern, RequestKind};
/// use http::Method;
///
/// let pattern = Pattern::compile(&RequestKind::http(Method::GET), "/users/{user}").unwrap();
/// let captures = pattern.matches(&["users", "42"]).unwrap();
/// assert_eq!(captures.get("user"), Some("42"));
///
/// assert!(pattern.matches(&["users"]).is_none());
/// assert!(pattern.matches(&["posts", "42"]).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles `source` using the tokenizer of `kind`.
    ///
    /// Web patterns may not contain `?`: inputs are matched with their query
    /// string stripped, so anything after it could never be compared.
    pub fn compile(kind: &RequestKind, source: &str) -> Result<Self, PatternError> {
        if !kind.is_command() {
            if let Some(segment) = source.split('/').find(|s| s.contains('?')) {
                return Err(malformed(source, segment));
            }
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for token in kind.tokenize(source) {
            let segment = parse_segment(source, token)?;
            if let Segment::Variable(name) = &segment {
                if !seen.insert(name.clone()) {
                    return Err(PatternError::DuplicateVariable {
                        pattern: source.to_string(),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The pattern as it was registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root pattern (`/`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Variable names in pattern order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::variable)
    }

    /// The leading literal segments, e.g. `["make:migration"]` for
    /// `make:migration {name}`.
    #[must_use]
    pub fn literal_head(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Variable(_) => None,
            })
            .collect()
    }

    /// Matches a token sequence against this pattern.
    ///
    /// Lengths must be equal and every literal must match exactly; variables
    /// capture unconditionally.
    #[must_use]
    pub fn matches(&self, tokens: &[&str]) -> Option<Captures> {
        if tokens.len() != self.segments.len() {
            return None;
        }

        let mut captures = Captures::with_capacity(self.segments.len());
        for (segment, token) in self.segments.iter().zip(tokens) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != token {
                        return None;
                    }
                }
                Segment::Variable(name) => captures.push(name.as_str(), *token),
            }
        }

        Some(captures)
    }
}

fn parse_segment(pattern: &str, token: &str) -> Result<Segment, PatternError> {
    if let Some(inner) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        if inner.is_empty() {
            return Err(PatternError::EmptyVariable {
                pattern: pattern.to_string(),
            });
        }
        if inner.contains(['{', '}']) {
            return Err(malformed(pattern, token));
        }
        return Ok(Segment::Variable(inner.to_string()));
    }

    if token.contains(['{', '}']) {
        return Err(malformed(pattern, token));
    }

    Ok(Segment::Literal(token.to_string()))
}

fn malformed(pattern: &str, segment: &str) -> PatternError {
    PatternError::MalformedSegment {
        pattern: pattern.to_string(),
        segment: segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn web(source: &str) -> Result<Pattern, PatternError> {
        Pattern::compile(&RequestKind::http(Method::GET), source)
    }

    #[test]
    fn test_compile_literals_and_variables() {
        let pattern = web("/users/{user}/posts").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Variable("user".into()),
                Segment::Literal("posts".into()),
            ]
        );
        assert_eq!(pattern.variables().collect::<Vec<_>>(), vec!["user"]);
    }

    #[test]
    fn test_compile_root() {
        let pattern = web("/").unwrap();
        assert!(pattern.is_empty());
        assert!(pattern.matches(&[]).is_some());
    }

    #[test]
    fn test_compile_rejects_duplicate_variable() {
        let err = web("/{id}/x/{id}").unwrap_err();
        assert_eq!(
            err,
            PatternError::DuplicateVariable {
                pattern: "/{id}/x/{id}".into(),
                name: "id".into(),
            }
        );
    }

    #[test]
    fn test_compile_rejects_empty_and_malformed() {
        assert!(matches!(web("/users/{}"), Err(PatternError::EmptyVariable { .. })));
        assert!(matches!(
            web("/users/user-{id}"),
            Err(PatternError::MalformedSegment { .. })
        ));
        assert!(matches!(
            web("/users/{{id}}"),
            Err(PatternError::MalformedSegment { .. })
        ));
    }

    #[test]
    fn test_query_string_in_web_pattern_is_rejected() {
        assert_eq!(
            web("/users?active=1").unwrap_err(),
            PatternError::MalformedSegment {
                pattern: "/users?active=1".into(),
                segment: "users?active=1".into(),
            }
        );
        assert!(matches!(
            web("/users/{user}/posts?"),
            Err(PatternError::MalformedSegment { ref segment, .. }) if segment == "posts?"
        ));

        let help = Pattern::compile(&RequestKind::console(), "help?").unwrap();
        assert!(help.matches(&["help?"]).is_some());
    }

    #[test]
    fn test_matches_requires_equal_length() {
        let pattern = web("/users/{user}").unwrap();
        assert!(pattern.matches(&["users"]).is_none());
        assert!(pattern.matches(&["users", "1", "edit"]).is_none());
    }

    #[test]
    fn test_matches_is_case_sensitive() {
        let pattern = web("/users").unwrap();
        assert!(pattern.matches(&["Users"]).is_none());
    }

    #[test]
    fn test_command_pattern_head() {
        let pattern = Pattern::compile(&RequestKind::console(), "make:migration {name} {table}").unwrap();
        assert_eq!(pattern.literal_head(), vec!["make:migration"]);
        assert_eq!(pattern.variables().collect::<Vec<_>>(), vec!["name", "table"]);

        let captures = pattern.matches(&["make:migration", "create_users", "users"]).unwrap();
        assert_eq!(captures.get("table"), Some("users"));
    }
}

//! Captured route variables.
//!
//! This module provides efficient storage for the values captured by a
//! pattern's variable segments, using a small-vector optimization to avoid
//! heap allocations for the common cases (1-4 variables).

use smallvec::SmallVec;

/// Maximum number of captures stored inline (stack allocated).
const INLINE_CAPTURES: usize = 4;

/// Variables captured while matching a token sequence against a route.
///
/// Stored as (name, value) pairs. Names are unique per route because
/// patterns reject duplicate variable names at registration time; pushing a
/// name twice replaces the earlier value.
///
/// # Example
///
/// ```rust
/// use hermes_router::Captures;
///
/// let mut captures = Captures::new();
/// captures.push("user", "42");
/// captures.push("post", "hello-world");
///
/// assert_eq!(captures.get("user"), Some("42"));
/// assert_eq!(captures.get("post"), Some("hello-world"));
/// assert_eq!(captures.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    inner: SmallVec<[(String, String); INLINE_CAPTURES]>,
}

impl Captures {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capture set with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Adds a captured value, replacing any earlier value with the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.inner.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.inner.push((name, value)),
        }
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a value was captured for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over (name, value) pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Captures {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Captures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut captures = Self::new();
        for (name, value) in iter {
            captures.push(name, value);
        }
        captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_new() {
        let captures = Captures::new();
        assert!(captures.is_empty());
        assert_eq!(captures.len(), 0);
    }

    #[test]
    fn test_captures_push_and_get() {
        let mut captures = Captures::new();
        captures.push("id", "123");
        captures.push("name", "alice");

        assert_eq!(captures.get("id"), Some("123"));
        assert_eq!(captures.get("name"), Some("alice"));
        assert_eq!(captures.get("unknown"), None);
        assert!(captures.contains("id"));
    }

    #[test]
    fn test_captures_push_replaces() {
        let mut captures = Captures::new();
        captures.push("id", "1");
        captures.push("id", "2");

        assert_eq!(captures.len(), 1);
        assert_eq!(captures.get("id"), Some("2"));
    }

    #[test]
    fn test_captures_iter_keeps_order() {
        let mut captures = Captures::new();
        captures.push("a", "1");
        captures.push("b", "2");

        let pairs: Vec<_> = captures.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_captures_from_iterator() {
        let pairs = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];

        let captures: Captures = pairs.into_iter().collect();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures.get("b"), Some("2"));
    }

    #[test]
    fn test_captures_spill_past_inline() {
        let mut captures = Captures::with_capacity(2);
        for i in 0..10 {
            captures.push(format!("key{i}"), format!("value{i}"));
        }

        assert_eq!(captures.len(), 10);
        assert_eq!(captures.get("key5"), Some("value5"));
    }
}

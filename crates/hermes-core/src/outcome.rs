//! Validation outcome.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field name to rendered message.
///
/// Empty exactly when validation passed. Recording a second failure for a
/// field replaces the first, so the last failing rule wins.
///
/// # Example
///
/// ```
/// use hermes_core::ValidationOutcome;
///
/// let mut outcome = ValidationOutcome::new();
/// assert!(outcome.passed());
///
/// outcome.record("email", "email is required");
/// outcome.record("email", "email is not an email address");
/// assert_eq!(outcome.message("email"), Some("email is not an email address"));
/// assert_eq!(outcome.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationOutcome {
    messages: IndexMap<String, String>,
}

impl ValidationOutcome {
    /// Creates an empty, passing outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`, replacing any earlier message.
    pub fn record(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(field.into(), message.into());
    }

    /// True when no field failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.messages.is_empty()
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn message(&self, field: &str) -> Option<&str> {
        self.messages.get(field).map(String::as_str)
    }

    /// Failed fields with their messages, in first-failure order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Same as [`passed`](Self::passed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Converts into the underlying map.
    #[must_use]
    pub fn into_messages(self) -> IndexMap<String, String> {
        self.messages
    }
}

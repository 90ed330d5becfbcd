//! Test fixtures for Hermes development and testing.
//!
//! [`MemoryPersistence`] is an in-memory [`Persistence`] collaborator used by
//! the binder, validation and dispatcher tests.
//!
//! # Example
//!
//! ```
//! use hermes_core::fixtures::MemoryPersistence;
//! use hermes_core::Persistence;
//! use serde_json::json;
//!
//! let mut store = MemoryPersistence::new();
//! store.insert("user", "id", json!({"id": 1, "email": "ada@example.com"}));
//!
//! let found = store.find_one("user", "email", &json!("ada@example.com")).unwrap();
//! assert_eq!(found.unwrap().get("id"), Some(&json!(1)));
//! assert_eq!(store.lookups(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Map, Value};

use crate::entity::{Entity, Persistence};
use crate::error::PersistenceError;
use crate::value::to_text;

/// In-memory entity store that counts its lookups.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    tables: HashMap<String, (String, Vec<Map<String, Value>>)>,
    lookups: AtomicUsize,
    failing: bool,
}

impl MemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every lookup fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Adds a row. Non-object values are ignored.
    pub fn insert(&mut self, entity: &str, key_column: &str, row: Value) {
        let Value::Object(row) = row else {
            return;
        };
        self.tables
            .entry(entity.to_string())
            .or_insert_with(|| (key_column.to_string(), Vec::new()))
            .1
            .push(row);
    }

    /// Number of `find_one` calls so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Persistence for MemoryPersistence {
    fn find_one(
        &self,
        entity: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<Entity>, PersistenceError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(PersistenceError::new(entity, "store unavailable"));
        }

        let Some((key_column, rows)) = self.tables.get(entity) else {
            return Ok(None);
        };
        let wanted = to_text(value);
        Ok(rows
            .iter()
            .find(|row| row.get(column).is_some_and(|v| to_text(v) == wanted))
            .map(|row| Entity::new(entity, key_column.as_str(), row.clone())))
    }
}

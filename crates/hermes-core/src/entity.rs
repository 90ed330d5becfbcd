//! Entities, model binding metadata and the persistence boundary.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PersistenceError;
use crate::value::to_text;

/// A persistent record returned by the [`Persistence`] collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    entity_type: String,
    key_column: String,
    attributes: Map<String, Value>,
}

impl Entity {
    /// Creates an entity of `entity_type` whose primary key lives in `key_column`.
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        key_column: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            key_column: key_column.into(),
            attributes,
        }
    }

    /// The entity type, e.g. `user`.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The primary key column.
    #[must_use]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// The primary key value.
    #[must_use]
    pub fn key(&self) -> Option<&Value> {
        self.attributes.get(&self.key_column)
    }

    /// True when the primary key equals `key`, comparing textual forms so
    /// that a captured `"42"` equals a stored `42`.
    #[must_use]
    pub fn has_key(&self, key: &Value) -> bool {
        self.key().is_some_and(|own| to_text(own) == to_text(key))
    }

    /// Reads one attribute.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// All attributes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Converts the entity into its attribute object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }
}

/// Looks up persistent entities.
///
/// Lookups are synchronous single attempts; the core adds no retry or timeout.
pub trait Persistence: Send + Sync {
    /// Finds the first `entity` whose `column` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store itself fails. A missing
    /// row is `Ok(None)`.
    fn find_one(
        &self,
        entity: &str,
        column: &str,
        value: &Value,
    ) -> Result<Option<Entity>, PersistenceError>;
}

/// Registered entity types and their primary key columns.
///
/// Only parameters whose entity type is registered here are model bound.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    types: IndexMap<String, String>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entity_type` with its primary key column.
    pub fn register(&mut self, entity_type: impl Into<String>, key_column: impl Into<String>) {
        self.types.insert(entity_type.into(), key_column.into());
    }

    /// The primary key column of a registered type.
    #[must_use]
    pub fn key_column(&self, entity_type: &str) -> Option<&str> {
        self.types.get(entity_type).map(String::as_str)
    }

    /// True when `entity_type` is registered.
    #[must_use]
    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Per-request entity cache shared by validation and model binding.
///
/// Keyed by (slot name, entity type). A later insert under the same key
/// replaces the earlier entity.
#[derive(Debug, Clone, Default)]
pub struct BindingCache {
    entries: HashMap<(String, String), Entity>,
}

impl BindingCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entity` under `slot`, keyed by its own type.
    pub fn insert(&mut self, slot: impl Into<String>, entity: Entity) -> Option<Entity> {
        let key = (slot.into(), entity.entity_type().to_string());
        self.entries.insert(key, entity)
    }

    /// The entity of `entity_type` stored under `slot`.
    #[must_use]
    pub fn get(&self, slot: &str, entity_type: &str) -> Option<&Entity> {
        self.entries
            .get(&(slot.to_string(), entity_type.to_string()))
    }

    /// Removes and returns an entry.
    pub fn remove(&mut self, slot: &str, entity_type: &str) -> Option<Entity> {
        self.entries
            .remove(&(slot.to_string(), entity_type.to_string()))
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

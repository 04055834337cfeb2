//! Explicit per-entity schema descriptors.
//!
//! The compiler never inspects ORM metadata at runtime; callers hand it a
//! plain list of the entity's columns instead. Field names are stored in
//! column (snake_case) form, so lookups happen after normalization.
//!
//! ```rust
//! use crudql::{EntityScheme, FieldKind};
//!
//! let scheme = EntityScheme::new("Document")
//!     .field("id", FieldKind::Uuid)
//!     .field("title", FieldKind::Text)
//!     .field("created_at", FieldKind::Timestamp);
//!
//! assert!(scheme.contains("title"));
//! assert!(!scheme.contains("secret"));
//! ```

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Storage type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UUID primary/foreign keys.
    Uuid,
    /// Text columns.
    Text,
    /// Integer columns.
    Integer,
    /// Floating-point columns.
    Float,
    /// Boolean columns.
    Boolean,
    /// Timestamp columns.
    Timestamp,
    /// JSON document columns.
    Json,
}

/// A single declared field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name (snake_case).
    pub name: String,
    /// Storage type.
    pub kind: FieldKind,
}

/// Declared field set of one entity, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityScheme {
    entity: String,
    fields: IndexMap<String, FieldKind>,
}

impl EntityScheme {
    /// Create an empty scheme for the named entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: IndexMap::new(),
        }
    }

    /// Declare a field. Names are converted to column (snake_case) form.
    pub fn field(mut self, name: impl AsRef<str>, kind: FieldKind) -> Self {
        self.fields
            .insert(name.as_ref().to_case(Case::Snake), kind);
        self
    }

    /// The entity name (also the default table alias).
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Check whether a column is declared.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Storage type of a declared column.
    pub fn kind_of(&self, column: &str) -> Option<FieldKind> {
        self.fields.get(column).copied()
    }

    /// Declared columns, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Snapshot of the declared fields as descriptors.
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields
            .iter()
            .map(|(name, kind)| FieldDescriptor {
                name: name.clone(),
                kind: *kind,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_normalized_to_snake_case() {
        let scheme = EntityScheme::new("Event").field("createdAt", FieldKind::Timestamp);
        assert!(scheme.contains("created_at"));
        assert!(!scheme.contains("createdAt"));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let scheme = EntityScheme::new("User")
            .field("id", FieldKind::Uuid)
            .field("email", FieldKind::Text)
            .field("age", FieldKind::Integer);
        let columns: Vec<_> = scheme.columns().collect();
        assert_eq!(columns, vec!["id", "email", "age"]);
        assert_eq!(scheme.kind_of("age"), Some(FieldKind::Integer));
        assert_eq!(scheme.len(), 3);
    }
}

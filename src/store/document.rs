//! Document representation for the store
//!
//! A document is an arbitrary JSON object. The store enforces exactly one
//! structural rule: every stored document carries an `id` field equal to its
//! key in the collection. Nothing else is schema-checked; two documents in
//! the same collection may have entirely different field sets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field map of a document. With `preserve_order` enabled this is an
/// index-map, so field order (and collection iteration order) is insertion
/// order rather than an accident of hashing.
pub type Fields = serde_json::Map<String, Value>;

/// A single record in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Fields,
}

impl Document {
    pub(crate) fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// The document id. Guaranteed present on anything the store hands out.
    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Raw field lookup.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String field, if present and a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Boolean field, if present and a bool.
    pub fn flag(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Unsigned integer field, if present and numeric.
    pub fn number(&self, field: &str) -> Option<u64> {
        self.fields.get(field).and_then(Value::as_u64)
    }

    /// All fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consume into the underlying field map.
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.fields)
    }
}

//! HTTP request handlers
//!
//! One module per route family. Handlers read and write the document store
//! through the injected [`AppState`](crate::core::AppState), call the
//! external collaborators, and shape the JSON envelopes the admin console
//! expects. Any ordering beyond insertion order happens here, never in the
//! store.

pub mod enhance;
pub mod enquiries;
pub mod gallery;
pub mod life;
pub mod media;
pub mod seo;
pub mod system;
pub mod upload;

use crate::store::Document;
use serde_json::Value;

/// Document as a JSON object for response bodies.
pub(crate) fn doc_json(doc: Document) -> Value {
    Value::from(doc)
}

/// Sort key for "newest first" listings.
pub(crate) fn created_at(value: &Value) -> u64 {
    value.get("createdAt").and_then(Value::as_u64).unwrap_or(0)
}

/// Sort newest-first by `createdAt`.
pub(crate) fn sort_newest_first(items: &mut [Value]) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

/// Sort by display order (highest first), breaking ties newest-first.
/// Older documents used `sortOrder` for the same thing, so both are read.
pub(crate) fn sort_by_display_order(items: &mut [Value]) {
    fn order(value: &Value) -> u64 {
        value
            .get("displayOrder")
            .or_else(|| value.get("sortOrder"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
    items.sort_by(|a, b| {
        order(b)
            .cmp(&order(a))
            .then_with(|| created_at(b).cmp(&created_at(a)))
    });
}

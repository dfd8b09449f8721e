//! Storage and persistence layer
//!
//! A minimal document-database interface backed by one durable JSON file,
//! used by every API route handler for villa records: gallery media,
//! enhancement jobs, SEO metadata, content items, and enquiries.

pub mod document;
pub mod file;
pub mod query;

// Re-export main storage types
pub use document::{Document, Fields};
pub use file::{FileStore, GALLERY_COLLECTION};
pub use query::{FilterOp, Query};

//! File-backed document store
//!
//! An in-process stand-in for a hosted document database: named collections
//! of JSON documents keyed by generated ids, persisted as one JSON file.
//! The whole store is rewritten to disk on every mutation, via a temp file
//! and an atomic rename so a crash mid-write leaves the previous file
//! intact.
//!
//! Semantics worth knowing before reaching for this:
//! - Collections are created lazily on first use; a missing collection
//!   reads as empty, never as an error.
//! - Iteration order is insertion order, in memory and through the
//!   persisted file (`preserve_order` object maps end to end).
//! - Mutations serialize through one rwlock. That makes the store safe for
//!   one multi-threaded process; sharing the backing file between
//!   processes is unsupported.
//! - A failed save returns an error to the caller. The in-memory mutation
//!   is retained, so the caller knows exactly which write may not be
//!   durable.
//! - `get`/`update`/`delete` on a missing id are not errors; absence is a
//!   normal result here.

use crate::core::error::StoreError;
use crate::core::utils::current_timestamp_millis;
use crate::store::document::{Document, Fields};
use crate::store::query::{Filter, Query};
use crate::system::metrics;
use parking_lot::RwLock;
use rand::{distr::Alphanumeric, Rng};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Collection that receives the sample document on a fresh store.
pub const GALLERY_COLLECTION: &str = "galleryImages";

type StoreData = Map<String, Value>;

/// File-backed document store. Construct once and share by reference
/// (handlers receive it through the application state).
pub struct FileStore {
    path: PathBuf,
    inner: RwLock<StoreData>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing data.
    ///
    /// An unreadable or corrupt backing file is logged and replaced with an
    /// empty store; startup never fails on load. With `seed_sample` a fresh
    /// store gets one example gallery document so the admin console has
    /// something to render.
    pub fn open(path: impl Into<PathBuf>, seed_sample: bool) -> Self {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoreData>(&contents) {
                Ok(data) => {
                    debug!(path = %path.display(), collections = data.len(), "store loaded");
                    data
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt store file, starting empty");
                    StoreData::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => StoreData::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable store file, starting empty");
                StoreData::new()
            }
        };

        let store = Self {
            path,
            inner: RwLock::new(data),
        };

        if seed_sample && store.count(GALLERY_COLLECTION) == 0 {
            store.seed_sample_document();
        }

        store
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert `fields` as a new document with a generated id.
    ///
    /// The returned document is exactly what was stored, id included.
    pub fn add(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let mut data = self.inner.write();

        let coll = collection_mut(&mut data, collection);
        let mut id = generate_id();
        while coll.contains_key(&id) {
            id = generate_id();
        }

        let doc = with_id(id.clone(), fields);
        coll.insert(id.clone(), Value::Object(doc.clone()));

        metrics::store().writes.inc();
        debug!(collection, id = %id, total = coll.len(), "document added");

        self.persist(&data)?;
        Ok(Document::from_fields(doc))
    }

    /// Fetch a document by id. `None` when the collection or id is absent.
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let data = self.inner.read();
        data.get(collection)
            .and_then(Value::as_object)
            .and_then(|coll| coll.get(id))
            .and_then(Value::as_object)
            .map(|fields| Document::from_fields(fields.clone()))
    }

    /// Upsert: replace the document at `id` with `fields` regardless of
    /// prior existence. Replace, not merge; `update` is the merging one.
    pub fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let mut data = self.inner.write();

        let doc = with_id(id.to_string(), fields);
        let coll = collection_mut(&mut data, collection);
        coll.insert(id.to_string(), Value::Object(doc.clone()));

        metrics::store().writes.inc();
        self.persist(&data)?;
        Ok(Document::from_fields(doc))
    }

    /// Shallow-merge `partial` into the document at `id`.
    ///
    /// Returns `Ok(None)` without touching memory or disk when the target
    /// does not exist: a merge-update never creates a document.
    pub fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let mut data = self.inner.write();

        let existing = data
            .get_mut(collection)
            .and_then(Value::as_object_mut)
            .and_then(|coll| coll.get_mut(id))
            .and_then(Value::as_object_mut);

        let merged = match existing {
            Some(fields) => {
                for (key, value) in partial {
                    fields.insert(key, value);
                }
                // The id field always mirrors the collection key, even if
                // the partial tried to change it.
                fields.insert("id".to_string(), Value::String(id.to_string()));
                fields.clone()
            }
            None => return Ok(None),
        };

        metrics::store().writes.inc();
        self.persist(&data)?;
        Ok(Some(Document::from_fields(merged)))
    }

    /// Remove the document at `id`. Removing an absent document is a no-op.
    pub fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut data = self.inner.write();

        let removed = data
            .get_mut(collection)
            .and_then(Value::as_object_mut)
            .map(|coll| coll.remove(id).is_some())
            .unwrap_or(false);

        if !removed {
            return Ok(());
        }

        metrics::store().deletes.inc();
        self.persist(&data)
    }

    /// Remove every document in the collection, returning how many went.
    pub fn clear(&self, collection: &str) -> Result<usize, StoreError> {
        let mut data = self.inner.write();

        let removed = data
            .get_mut(collection)
            .and_then(Value::as_object_mut)
            .map(|coll| {
                let n = coll.len();
                coll.clear();
                n
            })
            .unwrap_or(0);

        if removed == 0 {
            return Ok(0);
        }

        metrics::store().deletes.inc_by(removed as u64);
        self.persist(&data)?;
        Ok(removed)
    }

    /// Start a filtered query against one collection.
    pub fn query<'a>(&'a self, collection: &str) -> Query<'a> {
        Query::new(self, collection)
    }

    /// Every document in the collection, in insertion order.
    pub fn all(&self, collection: &str) -> Vec<Document> {
        self.scan(collection, &[], None)
    }

    /// Number of documents in one collection.
    pub fn count(&self, collection: &str) -> usize {
        let data = self.inner.read();
        data.get(collection)
            .and_then(Value::as_object)
            .map(|coll| coll.len())
            .unwrap_or(0)
    }

    /// Names of all collections that currently exist.
    pub fn collection_names(&self) -> Vec<String> {
        let data = self.inner.read();
        data.keys().cloned().collect()
    }

    /// Total document count across all collections.
    pub fn document_count(&self) -> usize {
        let data = self.inner.read();
        data.values()
            .filter_map(Value::as_object)
            .map(|coll| coll.len())
            .sum()
    }

    pub(crate) fn scan(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> Vec<Document> {
        metrics::store().queries.inc();

        let data = self.inner.read();
        let Some(coll) = data.get(collection).and_then(Value::as_object) else {
            return Vec::new();
        };

        let matches = coll
            .values()
            .filter_map(Value::as_object)
            .filter(|fields| filters.iter().all(|f| f.matches(fields)))
            .map(|fields| Document::from_fields(fields.clone()));

        match limit {
            Some(n) => matches.take(n).collect(),
            None => matches.collect(),
        }
    }

    /// Rewrite the whole store to disk: serialize, write a sibling temp
    /// file, rename over the target.
    fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(data)?;

        let tmp = self.path.with_extension("tmp");
        let result = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &self.path));

        match result {
            Ok(()) => {
                metrics::store().saves.inc();
                Ok(())
            }
            Err(e) => {
                metrics::store().save_failures.inc();
                warn!(path = %self.path.display(), error = %e, "store save failed; last mutation is in memory only");
                Err(StoreError::Save(e))
            }
        }
    }

    fn seed_sample_document(&self) {
        let mut sample = Fields::new();
        sample.insert("title".into(), "Lakeside Villa Sample".into());
        sample.insert("description".into(), "Sample villa image".into());
        sample.insert("category".into(), "villa".into());
        sample.insert("objectPath".into(), "sample/villa.jpg".into());
        sample.insert("isActive".into(), Value::Bool(true));
        sample.insert(
            "createdAt".into(),
            Value::from(current_timestamp_millis()),
        );

        // An unwritable data directory should not stop startup, same as a
        // corrupt file on load.
        if let Err(e) = self.set(GALLERY_COLLECTION, "sample1", sample) {
            warn!(error = %e, "could not seed sample gallery document");
        }
    }
}

/// Build a document map whose first field is the id, followed by `fields`.
/// Any conflicting `id` in `fields` loses to the collection key.
fn with_id(id: String, fields: Fields) -> Fields {
    let mut doc = Fields::new();
    doc.insert("id".to_string(), Value::String(id));
    for (key, value) in fields {
        if key != "id" {
            doc.insert(key, value);
        }
    }
    doc
}

fn collection_mut<'a>(data: &'a mut StoreData, name: &str) -> &'a mut Map<String, Value> {
    let slot = data
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().expect("collection slot is an object")
}

fn generate_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!(
        "generated_{}_{}",
        current_timestamp_millis(),
        suffix.to_lowercase()
    )
}

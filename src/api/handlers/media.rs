//! Media association handlers
//!
//! Linking already-stored objects to gallery documents, and unlinking them
//! again. Association is keyed by object path, one document per path.

use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::store::{Fields, FilterOp, GALLERY_COLLECTION};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// POST /api/admin/media/associate
pub async fn associate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let filename = body.get("filename").and_then(Value::as_str);
    let object_path = body.get("objectPath").and_then(Value::as_str);
    let (Some(filename), Some(object_path)) = (filename, object_path) else {
        return Err(Error::invalid_input("Filename and object path are required"));
    };

    let existing = state
        .store
        .query(GALLERY_COLLECTION)
        .filter("objectPath", FilterOp::Eq, object_path)
        .first();
    if existing.is_some() {
        return Err(Error::already_exists(
            "Media already associated with this object path",
        ));
    }

    let metadata = body.get("metadata").cloned().unwrap_or_else(|| json!({}));
    let meta = |key: &str| metadata.get(key).cloned();
    let now = current_timestamp_millis();

    let record = json!({
        "filename": filename,
        "originalName": filename,
        "objectPath": object_path,
        "mimeType": meta("mimeType").unwrap_or_else(|| "image/jpeg".into()),
        "size": meta("size").unwrap_or_else(|| 0.into()),
        "title": meta("title").unwrap_or_else(|| filename.into()),
        "description": meta("description").unwrap_or_else(|| "".into()),
        "altText": meta("altText").unwrap_or_else(|| filename.into()),
        "tags": meta("tags").unwrap_or_else(|| json!([])),
        "category": meta("category").unwrap_or_else(|| "general".into()),
        "isHero": false,
        "isActive": true,
        "sortOrder": 0,
        "uploadedBy": "admin",
        "metadata": metadata,
        "createdAt": now,
        "updatedAt": now,
    });
    let fields = match record {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    };

    let doc = state.store.add(GALLERY_COLLECTION, fields)?;
    Ok(Json(json!({
        "success": true,
        "imageId": doc.id(),
        "message": "Media successfully associated with gallery",
    })))
}

/// Query parameters for association lookups
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindParams {
    object_path: Option<String>,
}

/// GET /api/admin/media/associate?objectPath=...
pub async fn find(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FindParams>,
) -> Result<Json<Value>> {
    let Some(object_path) = params.object_path.filter(|p| !p.is_empty()) else {
        return Err(Error::invalid_input("Object path is required"));
    };

    let images: Vec<Value> = state
        .store
        .query(GALLERY_COLLECTION)
        .filter("objectPath", FilterOp::Eq, object_path)
        .documents()
        .into_iter()
        .map(Value::from)
        .collect();

    let count = images.len();
    Ok(Json(json!({ "success": true, "images": images, "count": count })))
}

/// DELETE /api/admin/media/remove
///
/// Drops the gallery document and best-effort deletes the stored object;
/// a missing file is not worth failing the unlink over.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let Some(file_id) = body.get("fileId").and_then(Value::as_str) else {
        return Err(Error::invalid_input("File ID is required"));
    };

    if let Some(doc) = state.store.get(GALLERY_COLLECTION, file_id) {
        if let Some(path) = doc.text("objectPath") {
            if let Err(e) = state.media.remove_object(path) {
                warn!(file_id, path, error = %e, "stored object could not be removed");
            }
        }
        state.store.delete(GALLERY_COLLECTION, file_id)?;
    }

    Ok(Json(json!({
        "success": true,
        "message": "File removed successfully",
    })))
}

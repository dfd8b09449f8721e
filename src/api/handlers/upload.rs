//! Gallery upload handler
//!
//! Multipart upload: each accepted file lands in the media library and
//! gets a gallery document. Failures are collected per file so one bad
//! upload never sinks the batch.

use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::services::media::{is_supported_mime, sanitize_filename, MediaType};
use crate::store::{Fields, GALLERY_COLLECTION};
use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// POST /api/admin/gallery/upload
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut uploaded: Vec<Value> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Malformed multipart body: {e}")))?
    {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(format!("Failed to read {original_name}: {e}"));
                continue;
            }
        };

        if !is_supported_mime(&mime) {
            warn!(file = %original_name, mime, "rejected upload");
            errors.push(format!("Unsupported file type: {mime}"));
            continue;
        }
        if bytes.len() > state.config.media.max_upload_bytes {
            errors.push(format!(
                "{original_name} exceeds the {} byte upload limit",
                state.config.media.max_upload_bytes
            ));
            continue;
        }

        let filename = format!(
            "gallery-{}-{}",
            current_timestamp_millis(),
            sanitize_filename(&original_name)
        );
        let object_path = format!("gallery/{filename}");

        if let Err(e) = state.media.store_object(&object_path, &bytes) {
            errors.push(format!("Failed to upload {original_name}: {e}"));
            continue;
        }

        let media_type = if mime.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        };

        match state.store.add(
            GALLERY_COLLECTION,
            gallery_record(state.as_ref(), &filename, &original_name, &object_path, &mime, bytes.len(), media_type),
        ) {
            Ok(doc) => {
                info!(file = %filename, size = bytes.len(), "upload stored");
                let mut record = doc.into_fields();
                record.insert("url".into(), state.media.public_url(&object_path).into());
                uploaded.push(Value::Object(record));
            }
            Err(e) => {
                // The object is on disk but the record write was not
                // durable; surface that instead of inventing an id.
                errors.push(format!("Failed to record {original_name}: {e}"));
            }
        }
    }

    if uploaded.is_empty() && errors.is_empty() {
        return Err(Error::invalid_input("No files provided"));
    }

    let message = if uploaded.is_empty() {
        "No files were successfully uploaded".to_string()
    } else {
        format!("Successfully uploaded {} files", uploaded.len())
    };

    Ok(Json(json!({
        "success": !uploaded.is_empty(),
        "uploaded": uploaded.len(),
        "images": uploaded,
        "failed": errors.iter().map(|e| json!({ "error": e })).collect::<Vec<_>>(),
        "message": message,
        "errors": errors,
    })))
}

fn gallery_record(
    state: &AppState,
    filename: &str,
    original_name: &str,
    object_path: &str,
    mime: &str,
    size: usize,
    media_type: MediaType,
) -> Fields {
    let property = &state.config.ai.property_name;
    let title = original_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(original_name);
    let now = current_timestamp_millis();

    let record = json!({
        "filename": filename,
        "originalName": original_name,
        "title": title,
        "description": "",
        "altText": format!("{property} {media_type}"),
        "seoDescription": "",
        "keywords": [],
        "category": "villa",
        "mediaType": media_type.as_str(),
        "objectPath": object_path,
        "mimeType": mime,
        "size": size,
        "isHero": false,
        "isFeatured": false,
        "isActive": true,
        "uploadedBy": "admin",
        "createdAt": now,
        "updatedAt": now,
    });
    match record {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}

//! Gallery collection handlers
//!
//! Admin CRUD over `galleryImages` plus the public cached listing and the
//! hero carousel feed. Listings fetch from the store and then sort/slice
//! here; the store itself only guarantees insertion order.

use crate::api::handlers::{doc_json, sort_by_display_order, sort_newest_first};
use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::services::media::{derive_media_type, MediaType};
use crate::store::{Fields, FilterOp, GALLERY_COLLECTION};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Query parameters for the admin gallery listing
#[derive(Deserialize)]
pub struct ListParams {
    category: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// GET /api/admin/gallery - paged admin listing with optional category filter
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);

    let mut query = state.store.query(GALLERY_COLLECTION);
    if let Some(category) = params.category.as_deref() {
        if category != "all" {
            query = query.filter("category", FilterOp::Eq, category);
        }
    }

    let mut images: Vec<Value> = query.documents().into_iter().map(present_admin).collect();
    let total = images.len();
    sort_newest_first(&mut images);
    let page: Vec<Value> = images.into_iter().skip(offset).take(limit).collect();

    Ok(Json(json!({
        "success": true,
        "images": page,
        "total": total,
        "pagination": {
            "limit": limit,
            "offset": offset,
            "hasMore": offset + limit < total,
        },
    })))
}

/// POST /api/admin/gallery - insert a gallery record
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let Value::Object(mut fields) = payload else {
        return Err(Error::invalid_input("Gallery record must be a JSON object"));
    };

    let now = current_timestamp_millis();
    fields.insert("createdAt".into(), now.into());
    fields.insert("updatedAt".into(), now.into());
    fields.insert("isActive".into(), Value::Bool(true));

    let doc = state.store.add(GALLERY_COLLECTION, fields)?;
    Ok(Json(json!({
        "success": true,
        "id": doc.id(),
        "image": doc_json(doc),
    })))
}

/// PUT /api/admin/gallery - merge-update a record by body id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let Value::Object(mut fields) = payload else {
        return Err(Error::invalid_input("Gallery update must be a JSON object"));
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => return Err(Error::invalid_input("Image ID required")),
    };

    fields.insert("updatedAt".into(), current_timestamp_millis().into());

    // Updating a missing id is not an error for this route: callers fire
    // blind updates during bulk edits, so echo the payload back either way.
    let image = match state.store.update(GALLERY_COLLECTION, &id, fields.clone())? {
        Some(doc) => doc_json(doc),
        None => {
            let mut echo = fields;
            echo.insert("id".into(), Value::String(id.clone()));
            Value::Object(echo)
        }
    };

    Ok(Json(json!({ "success": true, "id": id, "image": image })))
}

/// Query parameters for gallery deletion
#[derive(Deserialize)]
pub struct DeleteParams {
    id: Option<String>,
    action: Option<String>,
}

/// DELETE /api/admin/gallery - delete one record, or everything with
/// `action=clear-all`
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>> {
    if params.action.as_deref() == Some("clear-all") {
        let cleared = state.store.clear(GALLERY_COLLECTION)?;
        return Ok(Json(json!({
            "success": true,
            "message": format!("Cleared {cleared} gallery entries"),
            "cleared": cleared,
        })));
    }

    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return Err(Error::invalid_input("Image ID required"));
    };
    state.store.delete(GALLERY_COLLECTION, &id)?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// GET /api/admin/gallery/cached - public gallery feed with a short cache
pub async fn cached(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let images: Vec<Value> = state
        .store
        .query(GALLERY_COLLECTION)
        .filter("isActive", FilterOp::Eq, true)
        .documents()
        .into_iter()
        .map(doc_json)
        .filter(is_servable)
        .map(|img| present_public(&img))
        .collect();

    let count = images.len();
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=300")],
        Json(json!({ "success": true, "images": images, "count": count })),
    ))
}

/// Query parameters for the hero feed
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroParams {
    #[serde(default)]
    include_videos: Option<String>,
    #[serde(default)]
    videos_only: Option<String>,
}

/// GET /api/admin/gallery/hero - hero carousel feed, images by default,
/// videos on request, recent actives as a fallback when nothing is flagged
pub async fn hero(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeroParams>,
) -> Result<Json<Value>> {
    let videos_only = params.videos_only.as_deref() == Some("true");
    let include_videos = params.include_videos.as_deref() == Some("true");

    let wanted = |item: &Value| {
        let is_video = item_is_video(item);
        if videos_only {
            is_video
        } else if include_videos {
            true
        } else {
            !is_video
        }
    };

    let mut items: Vec<Value> = state
        .store
        .query(GALLERY_COLLECTION)
        .filter("isHero", FilterOp::Eq, true)
        .documents()
        .into_iter()
        .map(doc_json)
        .filter(|item| wanted(item))
        .collect();
    sort_by_display_order(&mut items);

    if items.is_empty() {
        // Nothing flagged as hero media: fall back to recent active items
        // of the requested kind so the landing page never renders empty.
        items = state
            .store
            .query(GALLERY_COLLECTION)
            .filter("isActive", FilterOp::Eq, true)
            .documents()
            .into_iter()
            .map(doc_json)
            .filter(|item| wanted(item))
            .collect();
        sort_newest_first(&mut items);
        items.truncate(6);
    }

    let images: Vec<Value> = items
        .iter()
        .filter(|item| {
            item.get("objectPath")
                .and_then(Value::as_str)
                .is_some_and(|p| !p.is_empty())
        })
        .map(present_hero)
        .collect();

    let count = images.len();
    Ok(Json(json!({ "success": true, "images": images, "count": count })))
}

fn item_media_type(item: &Value) -> MediaType {
    derive_media_type(
        item.get("mediaType").and_then(Value::as_str),
        item.get("mimeType").and_then(Value::as_str),
        item.get("objectPath").and_then(Value::as_str),
    )
}

fn item_is_video(item: &Value) -> bool {
    item_media_type(item) == MediaType::Video
}

/// Admin listing shape: full document plus derived fields the console
/// relies on.
fn present_admin(doc: crate::store::Document) -> Value {
    let mut item = doc_json(doc);
    let media_type = item_media_type(&item);

    let object_path = item
        .get("objectPath")
        .or_else(|| item.get("src"))
        .or_else(|| item.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let display_url = object_path
        .as_deref()
        .map(|p| format!("/objects/{}", p.trim_start_matches('/')))
        .unwrap_or_else(|| "/objects/placeholder.jpg".to_string());

    if let Value::Object(fields) = &mut item {
        if let Some(path) = object_path {
            fields.insert("objectPath".into(), path.into());
        }
        fields.insert("displayUrl".into(), display_url.into());
        fields.insert("mediaType".into(), media_type.as_str().into());
    }
    item
}

/// Entries the public gallery can actually serve: a real object path that
/// is not seeded or test data.
fn is_servable(item: &Value) -> bool {
    match item.get("objectPath").and_then(Value::as_str) {
        Some(path) if !path.is_empty() => {
            !path.contains("test-upload.jpg") && !path.contains("sample/")
        }
        _ => false,
    }
}

/// Public projection: just the fields the gallery page renders.
fn present_public(item: &Value) -> Value {
    let media_type = item_media_type(item);
    json!({
        "id": item.get("id"),
        "objectPath": item.get("objectPath"),
        "filename": item.get("filename"),
        "title": item.get("title"),
        "description": item.get("description"),
        "altText": item.get("altText"),
        "seoDescription": item.get("seoDescription"),
        "category": item.get("category").and_then(Value::as_str).unwrap_or("villa"),
        "mediaType": media_type.as_str(),
        "mimeType": item.get("mimeType"),
        "isHero": item.get("isHero"),
        "isFeatured": item.get("isFeatured"),
        "keywords": item.get("keywords"),
        "createdAt": item.get("createdAt"),
    })
}

/// Hero carousel projection with guaranteed url/title defaults.
fn present_hero(item: &Value) -> Value {
    let object_path = item
        .get("objectPath")
        .and_then(Value::as_str)
        .unwrap_or_default();
    json!({
        "id": item.get("id"),
        "filename": item.get("filename").and_then(Value::as_str).unwrap_or("untitled"),
        "url": format!("/objects/{}", object_path.trim_start_matches('/')),
        "objectPath": object_path,
        "title": item.get("title").and_then(Value::as_str).unwrap_or("Untitled"),
        "altText": item.get("altText").and_then(Value::as_str).unwrap_or(""),
        "seoDescription": item
            .get("seoDescription")
            .or_else(|| item.get("description"))
            .and_then(Value::as_str)
            .unwrap_or(""),
        "keywords": item.get("keywords").cloned().unwrap_or_else(|| json!([])),
        "category": item.get("category").and_then(Value::as_str).unwrap_or("villa"),
        "mediaType": item_media_type(item).as_str(),
        "isHero": item.get("isHero").and_then(Value::as_bool).unwrap_or(false),
        "isFeatured": item.get("isFeatured").and_then(Value::as_bool).unwrap_or(false),
        "displayOrder": item
            .get("displayOrder")
            .or_else(|| item.get("sortOrder"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        "metadata": item.get("metadata").cloned().unwrap_or_else(|| json!({})),
        "createdAt": item.get("createdAt"),
    })
}

/// Shared helper for other handlers that need the raw document's object
/// path with the legacy fallbacks applied.
pub(crate) fn object_path_of(fields: &Fields) -> Option<&str> {
    fields
        .get("objectPath")
        .or_else(|| fields.get("src"))
        .or_else(|| fields.get("url"))
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
}

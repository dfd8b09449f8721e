//! Villa Life content handlers
//!
//! CRUD for the `villaLife` collection: local events, news, and offers
//! shown on the marketing site. Items move through a small status
//! workflow (draft, review, published, archived) managed by the console.

use crate::api::handlers::sort_by_display_order;
use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::store::FilterOp;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Collection holding villa life content items.
pub const LIFE_COLLECTION: &str = "villaLife";

/// Query parameters for the content listing
#[derive(Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    kind: Option<String>,
    active: Option<String>,
}

/// GET /api/admin/villa-life - filtered by type and active flag
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let mut query = state.store.query(LIFE_COLLECTION);
    if let Some(kind) = params.kind.as_deref() {
        query = query.filter("type", FilterOp::Eq, kind);
    }
    if let Some(active) = params.active.as_deref() {
        query = query.filter("isActive", FilterOp::Eq, active == "true");
    }

    let mut items: Vec<Value> = query.documents().into_iter().map(Value::from).collect();
    sort_by_display_order(&mut items);

    Ok(Json(json!({ "success": true, "data": items })))
}

/// POST /api/admin/villa-life - create an item, defaulting to a draft
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let Value::Object(mut fields) = payload else {
        return Err(Error::invalid_input("Content item must be a JSON object"));
    };

    for (key, missing) in [("title", "Title is required"), ("type", "Type is required")] {
        let present = fields
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !present {
            return Err(Error::invalid_input(missing));
        }
    }

    fields
        .entry("isActive".to_string())
        .or_insert(Value::Bool(true));
    fields
        .entry("isFeatured".to_string())
        .or_insert(Value::Bool(false));
    fields
        .entry("status".to_string())
        .or_insert_with(|| "draft".into());

    let now = current_timestamp_millis();
    fields.insert("createdAt".into(), now.into());
    fields.insert("updatedAt".into(), now.into());

    let doc = state.store.add(LIFE_COLLECTION, fields)?;
    Ok(Json(json!({ "success": true, "data": Value::from(doc) })))
}

/// PUT /api/admin/villa-life - merge-update by body id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let Value::Object(mut fields) = payload else {
        return Err(Error::invalid_input("Content item must be a JSON object"));
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => return Err(Error::invalid_input("ID is required for updates")),
    };

    fields.insert("updatedAt".into(), current_timestamp_millis().into());

    match state.store.update(LIFE_COLLECTION, &id, fields)? {
        Some(doc) => Ok(Json(json!({ "success": true, "data": Value::from(doc) }))),
        None => Err(Error::not_found(format!("Content item not found: {id}"))),
    }
}

/// Query parameters for content deletion
#[derive(Deserialize)]
pub struct DeleteParams {
    id: Option<String>,
}

/// DELETE /api/admin/villa-life?id=...
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>> {
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return Err(Error::invalid_input("ID is required"));
    };
    state.store.delete(LIFE_COLLECTION, &id)?;
    Ok(Json(json!({ "success": true, "id": id })))
}

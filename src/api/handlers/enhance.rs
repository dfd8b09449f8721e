//! Enhancement handlers
//!
//! Queueing and inspecting enhancement jobs, the synchronous basic
//! enhancement pass, and thumbnails. The heavy pixel work happens in the
//! external processor; these routes own the job records and the document
//! updates around it.

use crate::api::handlers::{doc_json, gallery::object_path_of, sort_newest_first};
use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::services::enhance::{build_job, EnhanceModel, EnhancePreset, JOBS_COLLECTION};
use crate::services::media::video_poster_svg;
use crate::store::{Fields, FilterOp, GALLERY_COLLECTION};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const RECENT_JOBS: usize = 20;

/// POST /api/admin/gallery/enhance - queue a job against one model
pub async fn queue(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let gallery_id = body.get("galleryId").and_then(Value::as_str);
    let model_name = body.get("model").and_then(Value::as_str);
    let (Some(gallery_id), Some(model_name)) = (gallery_id, model_name) else {
        return Err(Error::invalid_input("Missing galleryId or model"));
    };

    let model = EnhanceModel::parse(model_name).ok_or_else(|| {
        Error::invalid_input(format!(
            "Invalid model. Must be one of: {}",
            EnhanceModel::NAMES.join(", ")
        ))
    })?;

    let preset = match body.get("preset").and_then(Value::as_str) {
        None => EnhancePreset::Medium,
        Some(name) => EnhancePreset::parse(name).ok_or_else(|| {
            Error::invalid_input(format!("Invalid preset: {name} (small, medium, full)"))
        })?,
    };

    let Some(gallery_doc) = state.store.get(GALLERY_COLLECTION, gallery_id) else {
        return Err(Error::not_found(format!("Gallery item not found: {gallery_id}")));
    };

    let overrides = body.get("params").and_then(Value::as_object);
    let job = build_job(
        gallery_id,
        model,
        preset,
        overrides,
        object_path_of(gallery_doc.fields()),
    );
    let job_doc = state.store.add(JOBS_COLLECTION, job)?;

    info!(gallery_id, model = model.as_str(), job_id = job_doc.id(), "enhancement job queued");
    Ok(Json(json!({
        "success": true,
        "jobId": job_doc.id(),
        "message": format!("Enhancement job queued for {} model", model.as_str()),
    })))
}

/// Query parameters for job status lookups
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    job_id: Option<String>,
    gallery_id: Option<String>,
}

/// GET /api/admin/gallery/enhance - one job, a gallery item's jobs, or the
/// most recent jobs. Sorting is done here; the store returns insertion
/// order.
pub async fn status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> Result<Json<Value>> {
    if let Some(job_id) = params.job_id.as_deref() {
        let Some(job) = state.store.get(JOBS_COLLECTION, job_id) else {
            return Err(Error::not_found("Job not found"));
        };
        return Ok(Json(json!({ "success": true, "job": doc_json(job) })));
    }

    let mut jobs: Vec<Value> = match params.gallery_id.as_deref() {
        Some(gallery_id) => state
            .store
            .query(JOBS_COLLECTION)
            .filter("galleryId", FilterOp::Eq, gallery_id)
            .documents(),
        None => state.store.all(JOBS_COLLECTION),
    }
    .into_iter()
    .map(doc_json)
    .collect();

    sort_newest_first(&mut jobs);
    if params.gallery_id.is_none() {
        jobs.truncate(RECENT_JOBS);
    }

    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

/// POST /api/admin/gallery/enhance-basic
///
/// Run the basic enhancement recipe through the external processor and
/// append the result to the document's `variants`.
pub async fn basic(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let Some(id) = body.get("id").and_then(Value::as_str) else {
        return Err(Error::invalid_input("Missing id"));
    };

    let Some(doc) = state.store.get(GALLERY_COLLECTION, id) else {
        return Err(Error::not_found("Image not found"));
    };
    let object_path = object_path_of(doc.fields())
        .ok_or_else(|| Error::invalid_input("Image has no stored object"))?
        .to_string();

    let processor = state
        .processor
        .as_ref()
        .ok_or_else(|| Error::Unavailable("image processor not configured".to_string()))?;

    let original = state.media.read_object(&object_path)?;
    let enhanced = processor.enhance_basic(&original).await?;
    info!(
        id,
        original_size = original.len(),
        enhanced_size = enhanced.bytes.len(),
        "basic enhancement completed"
    );

    let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(&enhanced.bytes));
    let variant = json!({
        "kind": "basic",
        "dataUrl": data_url,
        "createdAt": current_timestamp_millis(),
        "originalSize": original.len(),
        "enhancedSize": enhanced.bytes.len(),
        "enhancements": enhanced.operations,
    });

    let mut variants = doc
        .get("variants")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    variants.push(variant.clone());

    let mut update = Fields::new();
    update.insert("variants".into(), Value::Array(variants));
    update.insert("updatedAt".into(), current_timestamp_millis().into());
    state.store.update(GALLERY_COLLECTION, id, update)?;

    let ratio = enhanced.bytes.len() as f64 / original.len().max(1) as f64;
    Ok(Json(json!({
        "success": true,
        "variant": variant,
        "stats": {
            "originalSize": original.len(),
            "enhancedSize": enhanced.bytes.len(),
            "compressionRatio": (ratio * 100.0).round() / 100.0,
        },
    })))
}

/// Query parameters for thumbnail rendering
#[derive(Deserialize)]
pub struct ThumbnailParams {
    path: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    size: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

/// GET /api/admin/gallery/thumbnail
///
/// Videos get the branded SVG poster. Images come back resized when a
/// processor is configured, original bytes otherwise.
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ThumbnailParams>,
) -> Result<impl IntoResponse> {
    let Some(path) = params.path.filter(|p| !p.is_empty()) else {
        return Err(Error::invalid_input("Missing path parameter"));
    };

    let size = params.size.unwrap_or(300);
    let width = params.width.unwrap_or(size).max(1);
    let height = params.height.unwrap_or(width * 3 / 4).max(1);

    if params.kind.as_deref() == Some("video") {
        let svg = video_poster_svg(width, height, &state.config.ai.property_name);
        return Ok((
            [
                (header::CONTENT_TYPE, "image/svg+xml".to_string()),
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            svg.into_bytes(),
        ));
    }

    let original = state.media.read_object(path.trim_start_matches('/'))?;
    let bytes = match &state.processor {
        Some(processor) => match processor.resize(&original, width, height).await {
            Ok(resized) => resized,
            Err(e) => {
                warn!(path, error = %e, "thumbnail resize failed, serving original");
                original
            }
        },
        None => original,
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    ))
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

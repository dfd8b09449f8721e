//! SEO and analysis handlers
//!
//! The routes that wrap the vision/text model: per-item analysis (with a
//! stock fallback so the console flow never dead-ends), batched analysis,
//! the strict gallery SEO generator, and page-level SEO content.

use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::services::ai::{normalize_image_data_url, SeoFields, SeoRequest};
use crate::services::media::{has_video_extension, MediaType};
use crate::store::{Fields, FilterOp, GALLERY_COLLECTION};
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// POST /api/admin/gallery/analyze
///
/// Accepts `imageBase64`/`image`/`base64` for stills or a filename for
/// videos. On success the matching gallery document (by filename) is
/// updated with the generated fields. Model failures degrade to stock
/// analysis flagged `fallback: true`; only missing input is an error.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let filename = body.get("filename").and_then(Value::as_str);
    let category = body
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or("villa")
        .to_string();

    let is_video = body.get("mediaType").and_then(Value::as_str) == Some("video")
        || filename.is_some_and(has_video_extension);

    if is_video {
        let name = filename.unwrap_or("untitled");
        let analysis = match state.ai.analyze_video(name, &category).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(filename = name, error = %e, "video analysis failed, using stock copy");
                return Ok(Json(json!({
                    "success": true,
                    "analysis": state.ai.fallback_analysis(&category, MediaType::Video),
                })));
            }
        };
        apply_analysis(&state, filename, &analysis)?;
        return Ok(Json(json!({ "success": true, "analysis": analysis })));
    }

    let image = body
        .get("imageBase64")
        .or_else(|| body.get("image"))
        .or_else(|| body.get("base64"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::invalid_input("Image data required (imageBase64, image, or base64)")
        })?;

    let outcome = async {
        let image_url = normalize_image_data_url(image)?;
        state.ai.analyze_image(&image_url, &category).await
    }
    .await;

    match outcome {
        Ok(analysis) => {
            apply_analysis(&state, filename, &analysis)?;
            Ok(Json(json!({ "success": true, "analysis": analysis })))
        }
        Err(e) => {
            warn!(error = %e, "image analysis failed, using stock copy");
            Ok(Json(json!({
                "success": true,
                "analysis": state.ai.fallback_analysis(&category, MediaType::Image),
                "fallback": true,
                "error": e.to_string(),
            })))
        }
    }
}

/// Write generated fields back onto the gallery document whose `filename`
/// matches, when one exists.
fn apply_analysis(state: &AppState, filename: Option<&str>, analysis: &SeoFields) -> Result<()> {
    let Some(filename) = filename else {
        return Ok(());
    };
    let Some(doc) = state
        .store
        .query(GALLERY_COLLECTION)
        .filter("filename", FilterOp::Eq, filename)
        .first()
    else {
        return Ok(());
    };

    let mut update = Fields::new();
    update.insert("title".into(), analysis.title.clone().into());
    update.insert("altText".into(), analysis.alt_text.clone().into());
    update.insert("seoDescription".into(), analysis.seo_description.clone().into());
    update.insert("keywords".into(), analysis.keywords.clone().into());
    update.insert("confidenceScore".into(), analysis.confidence.into());
    update.insert("analysisStatus".into(), "completed".into());
    update.insert("updatedAt".into(), current_timestamp_millis().into());

    state.store.update(GALLERY_COLLECTION, doc.id(), update)?;
    info!(filename, "analysis applied to gallery document");
    Ok(())
}

const BATCH_SIZE: usize = 3;

/// POST /api/admin/gallery/batch-analyze
///
/// Analyzes `{ images: [{ filename, category, imageBase64 }] }` in chunks
/// of three with a short pause between chunks, reporting per-image results.
pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let Some(images) = body.get("images").and_then(Value::as_array).cloned() else {
        return Err(Error::invalid_input("Images array required"));
    };

    let mut results: Vec<Value> = Vec::with_capacity(images.len());

    for chunk in images.chunks(BATCH_SIZE) {
        let mut tasks = JoinSet::new();
        for (slot, image) in chunk.iter().cloned().enumerate() {
            let state = state.clone();
            tasks.spawn(async move { (slot, analyze_one(&state, &image).await) });
        }

        let mut chunk_results: Vec<(usize, Value)> = Vec::with_capacity(chunk.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => chunk_results.push((slot, result)),
                Err(e) => warn!(error = %e, "batch analysis task panicked"),
            }
        }
        chunk_results.sort_by_key(|(slot, _)| *slot);
        results.extend(chunk_results.into_iter().map(|(_, result)| result));

        if results.len() < images.len() {
            // Breathe between chunks so the vision API is not hammered
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }
    }

    let successful = results
        .iter()
        .filter(|r| r.get("success").and_then(Value::as_bool) == Some(true))
        .count();

    Ok(Json(json!({
        "success": true,
        "results": results,
        "processed": results.len(),
        "successful": successful,
    })))
}

async fn analyze_one(state: &AppState, image: &Value) -> Value {
    let filename = image
        .get("filename")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let category = image
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or("villa");

    let outcome = async {
        let data = image
            .get("imageBase64")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                crate::core::error::AiError::InvalidImage("imageBase64 missing".to_string())
            })?;
        let url = normalize_image_data_url(data)?;
        state.ai.analyze_image(&url, category).await
    }
    .await;

    match outcome {
        Ok(analysis) => json!({
            "filename": filename,
            "success": true,
            "analysis": analysis,
        }),
        Err(e) => {
            warn!(filename, error = %e, "batch item analysis failed");
            json!({
                "filename": filename,
                "success": false,
                "error": e.to_string(),
            })
        }
    }
}

/// POST /api/admin/gallery/seo
///
/// Strict SEO generation: schema-validated output or an error, never stock
/// copy. Videos contribute a poster frame, not the raw clip.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let media_type = if body.get("mediaType").and_then(Value::as_str) == Some("video") {
        MediaType::Video
    } else {
        MediaType::Image
    };

    let image_url = match media_type {
        MediaType::Image => body
            .get("url")
            .or_else(|| body.get("imageUrl"))
            .and_then(Value::as_str),
        MediaType::Video => body
            .get("poster")
            .or_else(|| body.get("thumbnail"))
            .and_then(Value::as_str),
    }
    .map(str::to_string);

    let request = SeoRequest {
        media_type,
        category: body
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string),
        human_title: body
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        image_url,
    };

    let (seo, used_model) = state.ai.generate_seo(&request).await.map_err(Error::Ai)?;

    // Persist onto the gallery document when the caller names one
    if let Some(id) = body.get("id").and_then(Value::as_str) {
        let mut update = Fields::new();
        update.insert("title".into(), seo.title.clone().into());
        update.insert("altText".into(), seo.alt_text.clone().into());
        update.insert("seoDescription".into(), seo.seo_description.clone().into());
        update.insert("keywords".into(), seo.keywords.clone().into());
        update.insert("confidenceScore".into(), seo.confidence.into());
        update.insert("updatedAt".into(), current_timestamp_millis().into());
        state.store.update(GALLERY_COLLECTION, id, update)?;
    }

    Ok(Json(json!({
        "success": true,
        "seo": seo,
        "usedModel": used_model,
    })))
}

/// POST /api/admin/generate-seo
///
/// Page/listing SEO content from an image plus any existing copy. Model
/// failures return stock content flagged `fallback: true`.
pub async fn page_seo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let Some(image_url) = body.get("imageUrl").and_then(Value::as_str) else {
        return Err(Error::invalid_input("Image URL is required"));
    };
    let category = body
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or("accommodation");

    let outcome = state
        .ai
        .seo_content(
            image_url,
            category,
            body.get("existingTitle").and_then(Value::as_str),
            body.get("existingDescription").and_then(Value::as_str),
        )
        .await;

    match outcome {
        Ok(content) => Ok(Json(json!({ "success": true, "seoContent": content }))),
        Err(e) => {
            warn!(error = %e, "page seo generation failed, using stock content");
            Ok(Json(json!({
                "success": true,
                "seoContent": state.ai.fallback_seo_content(category),
                "fallback": true,
                "error": e.to_string(),
            })))
        }
    }
}

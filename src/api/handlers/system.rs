//! System handlers: health, info, and metrics exposition

use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::system::metrics;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Health check response body
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    uptime: String,
    version: String,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime: format_uptime(state.uptime_secs()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/info
pub async fn info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "property": state.config.ai.property_name,
        "collections": state.store.collection_names(),
        "documents": state.store.document_count(),
        "aiConfigured": state.ai.is_configured(),
        "processorConfigured": state.processor.is_some(),
        "capabilities": [
            "gallery",
            "media-upload",
            "seo-analysis",
            "enhancement-jobs",
            "villa-life",
            "enquiries",
        ],
    }))
}

/// GET /metrics - Prometheus text exposition, when enabled
pub async fn metrics_text(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    if !state.config.metrics.enabled {
        return Err(Error::not_found("metrics disabled"));
    }
    let body = metrics::render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(5025), "1h 23m 45s");
    }
}

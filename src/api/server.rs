//! HTTP server implementation for the villa API

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers::{enhance, enquiries, gallery, life, media, seo, system, upload};
use crate::core::app_state::AppState;
use crate::core::error::Result;

/// Creates the main application router with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    // Uploads carry whole video files, so the body limit follows the
    // configured per-file cap with room for multipart framing
    let body_limit = DefaultBodyLimit::max(state.config.media.max_upload_bytes + 1024 * 1024);

    Router::new()
        // Gallery routes
        .route(
            "/api/admin/gallery",
            get(gallery::list)
                .post(gallery::create)
                .put(gallery::update)
                .delete(gallery::remove),
        )
        .route("/api/admin/gallery/upload", post(upload::upload))
        .route("/api/admin/gallery/cached", get(gallery::cached))
        .route("/api/admin/gallery/hero", get(gallery::hero))
        // SEO and analysis routes
        .route("/api/admin/gallery/analyze", post(seo::analyze))
        .route("/api/admin/gallery/batch-analyze", post(seo::batch_analyze))
        .route("/api/admin/gallery/seo", post(seo::generate))
        .route("/api/admin/generate-seo", post(seo::page_seo))
        // Enhancement routes
        .route(
            "/api/admin/gallery/enhance",
            post(enhance::queue).get(enhance::status),
        )
        .route("/api/admin/gallery/enhance-basic", post(enhance::basic))
        .route("/api/admin/gallery/thumbnail", get(enhance::thumbnail))
        // Media association routes
        .route(
            "/api/admin/media/associate",
            post(media::associate).get(media::find),
        )
        .route("/api/admin/media/remove", delete(media::remove))
        // Villa life content routes
        .route(
            "/api/admin/villa-life",
            get(life::list)
                .post(life::create)
                .put(life::update)
                .delete(life::remove),
        )
        // Public routes
        .route("/api/enquiries", post(enquiries::submit))
        .route("/api/health", get(system::health))
        .route("/api/info", get(system::info))
        .route("/metrics", get(system::metrics_text))
        // Stored objects served straight off disk
        .nest_service("/objects", ServeDir::new(state.media.root()))
        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(body_limit),
        )
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    tracing::info!("Starting villa API server on {}", addr);

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/api/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! End-to-end tests for the HTTP API against a fresh store per test.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use villa_server::core::config::Config;
use villa_server::{api::create_app, AppState};

fn test_app(dir: &TempDir) -> Router {
    let mut config = Config::default();
    config.store.data_dir = dir.path().join("data");
    config.store.seed_sample = false;
    config.media.upload_dir = dir.path().join("objects");
    let state = AppState::from_config(config).expect("state");
    create_app(state)
}

fn test_state(dir: &TempDir) -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.store.data_dir = dir.path().join("data");
    config.store.seed_sample = false;
    config.media.upload_dir = dir.path().join("objects");
    let state = AppState::from_config(config).expect("state");
    (create_app(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn gallery_crud_flow() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    // Create
    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({"filename": "pool.jpg", "objectPath": "gallery/pool.jpg", "category": "pool"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["image"]["isActive"], true);

    // Listed, with derived fields
    let (status, listed) = send(&app, get("/api/admin/gallery")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    let image = &listed["images"][0];
    assert_eq!(image["mediaType"], "image");
    assert_eq!(image["displayUrl"], "/objects/gallery/pool.jpg");

    // Category filter hits and misses
    let (_, by_category) = send(&app, get("/api/admin/gallery?category=pool")).await;
    assert_eq!(by_category["total"], 1);
    let (_, other_category) = send(&app, get("/api/admin/gallery?category=garden")).await;
    assert_eq!(other_category["total"], 0);

    // Update
    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            "/api/admin/gallery",
            json!({"id": id, "isActive": false, "title": "The pool"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["image"]["isActive"], false);
    assert_eq!(updated["image"]["filename"], "pool.jpg");

    // Public cached feed only serves active media
    let (_, cached) = send(&app, get("/api/admin/gallery/cached")).await;
    assert_eq!(cached["count"], 0);

    // Delete
    let (status, deleted) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/gallery?id={id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (_, empty) = send(&app, get("/api/admin/gallery")).await;
    assert_eq!(empty["total"], 0);
}

#[tokio::test]
async fn gallery_update_requires_id() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/admin/gallery", json!({"title": "no id"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn gallery_clear_all_reports_count() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    for i in 0..3 {
        send(
            &app,
            json_request("POST", "/api/admin/gallery", json!({"filename": format!("{i}.jpg")})),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/admin/gallery?action=clear-all")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 3);

    let (_, listed) = send(&app, get("/api/admin/gallery")).await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn cached_feed_skips_placeholder_paths() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_state(&dir);

    for path in ["sample/villa.jpg", "gallery/test-upload.jpg", "gallery/real.jpg"] {
        send(
            &app,
            json_request(
                "POST",
                "/api/admin/gallery",
                json!({"filename": "x.jpg", "objectPath": path}),
            ),
        )
        .await;
    }
    assert_eq!(state.store.count("galleryImages"), 3);

    let (status, cached) = send(&app, get("/api/admin/gallery/cached")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached["count"], 1);
    assert_eq!(cached["images"][0]["objectPath"], "gallery/real.jpg");
}

#[tokio::test]
async fn hero_feed_prefers_flagged_items_and_excludes_videos() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({
                "filename": "hero.jpg", "objectPath": "gallery/hero.jpg",
                "isHero": true, "mimeType": "image/jpeg", "displayOrder": 5,
            }),
        ),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({
                "filename": "tour.mp4", "objectPath": "gallery/tour.mp4",
                "isHero": true, "mimeType": "video/mp4",
            }),
        ),
    )
    .await;

    let (_, images_only) = send(&app, get("/api/admin/gallery/hero")).await;
    assert_eq!(images_only["count"], 1);
    assert_eq!(images_only["images"][0]["filename"], "hero.jpg");

    let (_, videos_only) = send(&app, get("/api/admin/gallery/hero?videosOnly=true")).await;
    assert_eq!(videos_only["count"], 1);
    assert_eq!(videos_only["images"][0]["mediaType"], "video");

    let (_, both) = send(&app, get("/api/admin/gallery/hero?includeVideos=true")).await;
    assert_eq!(both["count"], 2);
}

#[tokio::test]
async fn hero_feed_falls_back_to_recent_actives() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({"filename": "recent.jpg", "objectPath": "gallery/recent.jpg"}),
        ),
    )
    .await;

    let (_, fallback) = send(&app, get("/api/admin/gallery/hero")).await;
    assert_eq!(fallback["count"], 1);
    assert_eq!(fallback["images"][0]["filename"], "recent.jpg");
}

#[tokio::test]
async fn upload_stores_file_and_record() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_state(&dir);

    let boundary = "----villaboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"files\"; filename=\"lake view.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         fakejpegbytes\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/gallery/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["uploaded"], 1);

    let image = &response["images"][0];
    let filename = image["filename"].as_str().unwrap();
    assert!(filename.starts_with("gallery-"));
    assert!(filename.ends_with("lake_view.jpg"));

    // The object landed on disk under the upload root
    let object_path = image["objectPath"].as_str().unwrap();
    let stored = state.media.read_object(object_path).unwrap();
    assert_eq!(stored, b"fakejpegbytes");

    // And the document is in the store
    assert_eq!(state.store.count("galleryImages"), 1);
}

#[tokio::test]
async fn upload_rejects_unsupported_types() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let boundary = "----villaboundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         hello\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/gallery/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], false);
    assert_eq!(response["uploaded"], 0);
    assert!(response["errors"][0]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
}

#[tokio::test]
async fn enhance_jobs_lifecycle() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    // Unknown gallery item
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery/enhance",
            json!({"galleryId": "nope", "model": "gfpgan"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Create a gallery item, then queue against it
    let (_, created) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({"filename": "pool.jpg", "objectPath": "gallery/pool.jpg"}),
        ),
    )
    .await;
    let gallery_id = created["id"].as_str().unwrap().to_string();

    let (status, queued) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery/enhance",
            json!({"galleryId": gallery_id, "model": "realesrgan", "preset": "full"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let job_id = queued["jobId"].as_str().unwrap().to_string();

    // Invalid model is rejected up front
    let (status, rejected) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery/enhance",
            json!({"galleryId": gallery_id, "model": "dall-e"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(rejected["error"].as_str().unwrap().contains("realesrgan"));

    // Lookup by job id
    let (status, by_job) = send(
        &app,
        get(&format!("/api/admin/gallery/enhance?jobId={job_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_job["job"]["status"], "queued");
    assert_eq!(by_job["job"]["originalImagePath"], "gallery/pool.jpg");
    assert_eq!(by_job["job"]["params"]["face_enhance"], true);

    // Lookup by gallery id
    let (_, by_gallery) = send(
        &app,
        get(&format!("/api/admin/gallery/enhance?galleryId={gallery_id}")),
    )
    .await;
    assert_eq!(by_gallery["jobs"].as_array().unwrap().len(), 1);

    // Recent listing
    let (_, recent) = send(&app, get("/api/admin/gallery/enhance")).await;
    assert_eq!(recent["jobs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn enhance_basic_requires_processor() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let (_, created) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery",
            json!({"filename": "pool.jpg", "objectPath": "gallery/pool.jpg"}),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/api/admin/gallery/enhance-basic", json!({"id": id})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn thumbnail_returns_video_poster() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(get("/api/admin/gallery/thumbnail?path=gallery/tour.mp4&type=video&size=200"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "image/svg+xml"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let svg = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Ko Lake Villa"));
}

#[tokio::test]
async fn media_associate_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let payload = json!({"filename": "deck.jpg", "objectPath": "gallery/deck.jpg"});
    let (status, first) = send(
        &app,
        json_request("POST", "/api/admin/media/associate", payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/media/associate", payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, found) = send(
        &app,
        get("/api/admin/media/associate?objectPath=gallery/deck.jpg"),
    )
    .await;
    assert_eq!(found["count"], 1);
}

#[tokio::test]
async fn villa_life_workflow() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    // Missing title
    let (status, _) = send(
        &app,
        json_request("POST", "/api/admin/villa-life", json!({"type": "event"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, event) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/villa-life",
            json!({"title": "Full moon lake dinner", "description": "Dinner on the pier", "type": "event"}),
        ),
    )
    .await;
    assert_eq!(event["data"]["status"], "draft");
    assert_eq!(event["data"]["isActive"], true);
    let id = event["data"]["id"].as_str().unwrap().to_string();

    send(
        &app,
        json_request(
            "POST",
            "/api/admin/villa-life",
            json!({"title": "Monsoon rates", "description": "Seasonal offer", "type": "offer", "isActive": false}),
        ),
    )
    .await;

    // Filter by type and active flag
    let (_, events) = send(&app, get("/api/admin/villa-life?type=event")).await;
    assert_eq!(events["data"].as_array().unwrap().len(), 1);
    let (_, active) = send(&app, get("/api/admin/villa-life?active=true")).await;
    assert_eq!(active["data"].as_array().unwrap().len(), 1);

    // Publish it
    let (_, published) = send(
        &app,
        json_request(
            "PUT",
            "/api/admin/villa-life",
            json!({"id": id, "status": "published"}),
        ),
    )
    .await;
    assert_eq!(published["data"]["status"], "published");

    // Updating a missing item is a 404 here
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/admin/villa-life",
            json!({"id": "ghost", "status": "published"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enquiries_validate_and_persist() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_state(&dir);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/enquiries",
            json!({"name": "Asha", "email": "not-an-email", "message": "A long enough message."}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/enquiries")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(
            json!({
                "name": "Asha Perera",
                "email": "asha@example.com",
                "message": "We would love to book the lake suite in March.",
                "guests": 4,
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(state.store.count("enquiries"), 1);
}

#[tokio::test]
async fn analyze_requires_image_data() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery/analyze",
            json!({"filename": "pool.jpg"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Image data required"));
}

#[tokio::test]
async fn seo_generation_unconfigured_reports_unavailable() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/admin/gallery/seo",
            json!({"url": "https://example.com/pool.jpg", "category": "pool"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn system_endpoints_respond() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let (status, health) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    let (status, info) = send(&app, get("/api/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "villa-server");
    assert_eq!(info["aiConfigured"], false);

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn documents_survive_across_app_instances() {
    let dir = TempDir::new().unwrap();

    {
        let app = test_app(&dir);
        send(
            &app,
            json_request(
                "POST",
                "/api/admin/gallery",
                json!({"filename": "keep.jpg", "objectPath": "gallery/keep.jpg"}),
            ),
        )
        .await;
    }

    // New state over the same data directory sees the same documents
    let app = test_app(&dir);
    let (_, listed) = send(&app, get("/api/admin/gallery")).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["images"][0]["filename"], "keep.jpg");
}

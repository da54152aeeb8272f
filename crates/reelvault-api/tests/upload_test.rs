//! End-to-end tests for the upload routes, running the full router with an
//! in-memory catalog and a tempdir-backed local store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use reelvault_api::auth::{issue_token, JwtValidator};
use reelvault_api::setup_routes;
use reelvault_api::state::AppState;
use reelvault_catalog::{CatalogResult, MemoryVideoCatalog, VideoCatalog};
use reelvault_core::models::Video;
use reelvault_core::{Config, StorageBackend};
use reelvault_storage::LocalStore;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret-test-secret-test-secret!";
const BOUNDARY: &str = "X-TEST-BOUNDARY";

struct TestContext {
    app: Router,
    catalog: MemoryVideoCatalog,
    assets: TempDir,
}

fn test_config(assets_root: &str) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        jwt_secret: SECRET.to_string(),
        database_url: "postgresql://localhost/unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        assets_root: assets_root.to_string(),
        assets_base_url: "http://localhost:8091/assets".to_string(),
        max_thumbnail_size_bytes: 10 * 1024 * 1024,
        max_video_size_bytes: 1024 * 1024 * 1024,
        spool_threshold_bytes: 32 * 1024 * 1024,
        ffprobe_path: "ffprobe".to_string(),
    }
}

async fn test_context_with(adjust: impl FnOnce(&mut Config)) -> TestContext {
    let assets = TempDir::new().unwrap();
    let mut config = test_config(assets.path().to_str().unwrap());
    adjust(&mut config);

    let catalog = MemoryVideoCatalog::new();
    let storage = LocalStore::new(assets.path(), config.assets_base_url.clone())
        .await
        .unwrap();

    let state = Arc::new(AppState {
        config: config.clone(),
        catalog: Arc::new(catalog.clone()),
        storage: Arc::new(storage),
        credentials: Arc::new(JwtValidator::new(&config.jwt_secret)),
    });

    let app = setup_routes(&config, state).unwrap();

    TestContext {
        app,
        catalog,
        assets,
    }
}

async fn test_context() -> TestContext {
    test_context_with(|_| {}).await
}

fn sample_video(owner: Uuid) -> Video {
    Video {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        title: "boots and cats".to_string(),
        description: "a video".to_string(),
        user_id: owner,
        thumbnail_url: None,
        video_url: None,
    }
}

fn bearer(user_id: Uuid) -> String {
    format!(
        "Bearer {}",
        issue_token(SECRET, user_id, Duration::hours(1)).unwrap()
    )
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"upload.bin\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(path: &str, auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn thumbnail_upload_stores_object_and_updates_record() {
    let ctx = test_context().await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    let body = multipart_body("thumbnail", "image/jpeg", b"jpeg bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;

    let thumbnail_url = json["thumbnail_url"].as_str().unwrap();
    assert!(thumbnail_url.starts_with("http://localhost:8091/assets/"));
    assert!(thumbnail_url.ends_with(".jpg"));

    // Unrelated fields survive the update.
    assert_eq!(json["title"], "boots and cats");
    assert_eq!(json["user_id"], owner.to_string());
    assert!(json["video_url"].is_null());

    // The object is on disk under the generated key.
    let key = thumbnail_url
        .strip_prefix("http://localhost:8091/assets/")
        .unwrap();
    let stored = std::fs::read(ctx.assets.path().join(key)).unwrap();
    assert_eq!(stored, b"jpeg bytes");

    let reloaded = ctx.catalog.get_video(video.id).await.unwrap().unwrap();
    assert_eq!(reloaded.thumbnail_url.as_deref(), Some(thumbnail_url));
    assert!(reloaded.updated_at > video.updated_at);
}

#[tokio::test]
async fn video_upload_uses_orientation_prefix() {
    let ctx = test_context().await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    // Not a decodable container, so classification falls back to "other".
    let body = multipart_body("video", "video/mp4", b"not really mp4 data");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/video", video.id),
            Some(&bearer(owner)),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;

    let video_url = json["video_url"].as_str().unwrap();
    assert!(video_url.contains("/other/"), "url was {video_url}");
    assert!(video_url.ends_with(".mp4"));
    assert!(json["thumbnail_url"].is_null());
}

#[tokio::test]
async fn unsupported_content_type_is_rejected_without_storing() {
    let ctx = test_context().await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    let body = multipart_body("thumbnail", "image/gif", b"gif bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");

    // Nothing was stored and the record is untouched.
    assert!(std::fs::read_dir(ctx.assets.path()).unwrap().next().is_none());
    let reloaded = ctx.catalog.get_video(video.id).await.unwrap().unwrap();
    assert!(reloaded.thumbnail_url.is_none());
}

#[tokio::test]
async fn oversized_payload_is_rejected_with_413() {
    let ctx = test_context_with(|config| {
        config.max_thumbnail_size_bytes = 1024;
    })
    .await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    let body = multipart_body("thumbnail", "image/png", &vec![0u8; 4 * 1024]);
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(std::fs::read_dir(ctx.assets.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn non_owner_gets_403_and_record_is_unchanged() {
    let ctx = test_context().await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    let body = multipart_body("thumbnail", "image/jpeg", b"jpeg bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(Uuid::new_v4())),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = response_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");

    let reloaded = ctx.catalog.get_video(video.id).await.unwrap().unwrap();
    assert!(reloaded.thumbnail_url.is_none());
}

#[tokio::test]
async fn missing_or_malformed_credentials_get_401() {
    let ctx = test_context().await;
    let video_id = Uuid::new_v4();

    let body = multipart_body("thumbnail", "image/jpeg", b"jpeg bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video_id),
            None,
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video_id),
            Some("Bearer not-a-jwt"),
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = format!(
        "Bearer {}",
        issue_token(SECRET, Uuid::new_v4(), Duration::hours(-1)).unwrap()
    );
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video_id),
            Some(&expired),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_video_id_gets_structured_400() {
    let ctx = test_context().await;

    let body = multipart_body("thumbnail", "image/jpeg", b"jpeg bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            "/api/videos/not-a-uuid/thumbnail",
            Some(&bearer(Uuid::new_v4())),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn unknown_record_gets_404() {
    let ctx = test_context().await;

    let body = multipart_body("video", "video/mp4", b"mp4 bytes");
    let response = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/video", Uuid::new_v4()),
            Some(&bearer(Uuid::new_v4())),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = response_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

/// Delegates to the in-memory catalog, but deletes the record before every
/// update. Simulates the record vanishing between load and persist.
struct VanishingCatalog {
    inner: MemoryVideoCatalog,
}

#[async_trait::async_trait]
impl VideoCatalog for VanishingCatalog {
    async fn get_video(&self, id: Uuid) -> CatalogResult<Option<Video>> {
        self.inner.get_video(id).await
    }

    async fn update_video(&self, video: &Video) -> CatalogResult<bool> {
        self.inner.remove(video.id).await;
        self.inner.update_video(video).await
    }
}

#[tokio::test]
async fn record_deleted_mid_upload_gets_404() {
    let assets = TempDir::new().unwrap();
    let config = test_config(assets.path().to_str().unwrap());
    let catalog = MemoryVideoCatalog::new();
    let storage = LocalStore::new(assets.path(), config.assets_base_url.clone())
        .await
        .unwrap();
    let state = Arc::new(AppState {
        config: config.clone(),
        catalog: Arc::new(VanishingCatalog {
            inner: catalog.clone(),
        }),
        storage: Arc::new(storage),
        credentials: Arc::new(JwtValidator::new(&config.jwt_secret)),
    });
    let app = setup_routes(&config, state).unwrap();

    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    catalog.insert(video.clone()).await;

    let response = app
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            multipart_body("thumbnail", "image/jpeg", b"jpeg bytes"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = response_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(catalog.get_video(video.id).await.unwrap().is_none());
}

#[tokio::test]
async fn reupload_replaces_url_and_orphans_previous_object() {
    let ctx = test_context().await;
    let owner = Uuid::new_v4();
    let video = sample_video(owner);
    ctx.catalog.insert(video.clone()).await;

    let first = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            multipart_body("thumbnail", "image/png", b"first"),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_url = response_json(first).await["thumbnail_url"]
        .as_str()
        .unwrap()
        .to_string();

    let second = ctx
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/videos/{}/thumbnail", video.id),
            Some(&bearer(owner)),
            multipart_body("thumbnail", "image/png", b"second"),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_url = response_json(second).await["thumbnail_url"]
        .as_str()
        .unwrap()
        .to_string();

    assert_ne!(first_url, second_url);
    let reloaded = ctx.catalog.get_video(video.id).await.unwrap().unwrap();
    assert_eq!(reloaded.thumbnail_url.as_deref(), Some(second_url.as_str()));

    // The first object is orphaned in storage, not deleted.
    let first_key = first_url
        .strip_prefix("http://localhost:8091/assets/")
        .unwrap();
    assert_eq!(
        std::fs::read(ctx.assets.path().join(first_key)).unwrap(),
        b"first"
    );
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let ctx = test_context().await;
    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
}

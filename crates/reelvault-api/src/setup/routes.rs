//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use reelvault_core::{Config, StorageBackend};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Extra room on top of the payload ceiling for multipart framing (boundary
/// and part headers). The exact per-file ceiling is enforced while reading
/// the field.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/openapi.json", get(openapi_json));

    // Protected routes (require authentication). Body limits are per route
    // since the thumbnail and video ceilings differ by two orders of
    // magnitude.
    let protected_routes = Router::new()
        .route(
            "/api/videos/{video_id}/thumbnail",
            post(handlers::thumbnail_upload::upload_thumbnail).layer(DefaultBodyLimit::max(
                config.max_thumbnail_size_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route(
            "/api/videos/{video_id}/video",
            post(handlers::video_upload::upload_video).layer(DefaultBodyLimit::max(
                config.max_video_size_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut app = public_routes.merge(protected_routes);

    // Local storage serves its objects straight from disk.
    if config.storage_backend == StorageBackend::Local {
        app = app.nest_service("/assets", ServeDir::new(&config.assets_root));
    }

    let app = app
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };

    Ok(cors)
}

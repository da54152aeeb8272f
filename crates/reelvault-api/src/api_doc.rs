//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use reelvault_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelvault API",
        version = "0.1.0",
        description = "Authenticated media upload API for the video catalog. Thumbnails and video files are uploaded per catalog record; videos are prefixed by orientation in storage."
    ),
    paths(
        handlers::health::health,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::video_upload::upload_video,
    ),
    components(
        schemas(
            models::Video,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Thumbnail and video upload operations"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

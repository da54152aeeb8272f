use crate::auth::Principal;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_video_id;
use crate::services::upload::UploadService;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use reelvault_core::models::{MediaKind, Video};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}/video",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Catalog record id (UUID)")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video stored, updated record returned", body = Video),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the record", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;

    let video = UploadService::new(&state)
        .upload_media(video_id, principal, MediaKind::Video, multipart)
        .await?;

    Ok(Json(video))
}

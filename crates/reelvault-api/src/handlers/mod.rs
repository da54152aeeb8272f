pub mod health;
pub mod thumbnail_upload;
pub mod video_upload;

use crate::error::HttpAppError;
use reelvault_core::AppError;
use uuid::Uuid;

/// Parse a path segment as a record id. Non-UUID ids get a structured 400
/// instead of axum's plain-text rejection.
pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::InvalidInput("video_id must be a valid UUID".to_string()).into())
}

//! Media upload orchestration
//!
//! One code path drives both thumbnail and video uploads: load the catalog
//! record, check ownership, receive the payload, classify (videos only),
//! generate a key, store the object, then write the new URL back to the
//! record. The object is fully stored before the catalog row is touched, so a
//! catalog failure leaves at worst an orphaned object, never a dangling URL.

use crate::auth::Principal;
use crate::error::HttpAppError;
use crate::services::probe;
use crate::state::AppState;
use crate::utils::upload::read_media_field;
use axum::extract::Multipart;
use chrono::Utc;
use reelvault_core::models::{MediaKind, Video};
use reelvault_core::AppError;
use reelvault_storage::keys::generate_object_key;
use uuid::Uuid;

pub struct UploadService<'a> {
    state: &'a AppState,
}

impl<'a> UploadService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Run the upload pipeline for one media kind and return the updated
    /// record.
    pub async fn upload_media(
        &self,
        video_id: Uuid,
        principal: Principal,
        kind: MediaKind,
        multipart: Multipart,
    ) -> Result<Video, HttpAppError> {
        let video = self
            .state
            .catalog
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        // Ownership is checked before the body is read, so a non-owner cannot
        // make the server consume a large upload.
        if video.user_id != principal.0 {
            return Err(AppError::Forbidden(
                "Only the video owner may upload media for it".to_string(),
            )
            .into());
        }

        let limits = self.state.limits_for(kind);
        let mut payload = read_media_field(
            multipart,
            kind.field_name(),
            &limits,
            self.state.config.spool_threshold_bytes,
        )
        .await?;

        let prefix = match kind {
            MediaKind::Thumbnail => None,
            MediaKind::Video => {
                let staged = payload.stage_to_file().await?;
                let orientation =
                    probe::classify_video_file(&self.state.config.ffprobe_path, staged).await;
                Some(orientation.as_str())
            }
        };

        let key = generate_object_key(prefix, payload.extension());
        let content_type = payload.content_type();
        let size_bytes = payload.size_bytes();

        let reader = payload.into_reader().await?;
        let url = self
            .state
            .storage
            .put(&key, content_type, Some(size_bytes), Box::pin(reader))
            .await?;

        if let Some(previous) = video.media_url(kind) {
            // Last-writer-wins; the previous object stays in storage unreferenced.
            tracing::debug!(
                video_id = %video_id,
                previous_url = %previous,
                "Replacing existing media URL"
            );
        }

        let updated = video.with_media_url(kind, url, Utc::now());
        let persisted = self.state.catalog.update_video(&updated).await?;
        if !persisted {
            // Record was deleted between load and persist.
            return Err(AppError::NotFound("Video not found".to_string()).into());
        }

        tracing::info!(
            video_id = %video_id,
            media_kind = kind.as_str(),
            key = %key,
            size_bytes = size_bytes,
            content_type = content_type,
            "Media upload successful"
        );

        Ok(updated)
    }
}

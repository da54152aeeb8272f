//! Postgres-backed catalog store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::models::Video;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::store::{CatalogResult, VideoCatalog};

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    title: String,
    description: String,
    user_id: Uuid,
    thumbnail_url: Option<String>,
    video_url: Option<String>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Video {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            title: row.title,
            description: row.description,
            user_id: row.user_id,
            thumbnail_url: row.thumbnail_url,
            video_url: row.video_url,
        }
    }
}

/// Video catalog backed by the `videos` table.
#[derive(Clone)]
pub struct PgVideoCatalog {
    pool: PgPool,
}

impl PgVideoCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoCatalog for PgVideoCatalog {
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> CatalogResult<Option<Video>> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT id, created_at, updated_at, title, description, user_id, thumbnail_url, video_url \
             FROM videos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Video::from))
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update_video(&self, video: &Video) -> CatalogResult<bool> {
        // Only the URL columns and updated_at are writable; the rest of the
        // record is immutable across an upload.
        let result = sqlx::query(
            "UPDATE videos SET thumbnail_url = $2, video_url = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(video.id)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

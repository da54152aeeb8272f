use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A catalog record for a hosted video.
///
/// Created and destroyed elsewhere; the upload pipeline only ever replaces one
/// of the URL fields and refreshes `updated_at`. Everything else is immutable
/// across an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    /// Owner identity; only this user may mutate the record.
    pub user_id: Uuid,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
}

impl Video {
    /// Return a copy with the URL for `kind` replaced and `updated_at` set to `now`.
    /// All other fields are carried over unchanged.
    pub fn with_media_url(&self, kind: MediaKind, url: String, now: DateTime<Utc>) -> Video {
        let mut updated = self.clone();
        match kind {
            MediaKind::Thumbnail => updated.thumbnail_url = Some(url),
            MediaKind::Video => updated.video_url = Some(url),
        }
        updated.updated_at = now;
        updated
    }

    pub fn media_url(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Thumbnail => self.thumbnail_url.as_deref(),
            MediaKind::Video => self.video_url.as_deref(),
        }
    }
}

/// The two media payloads a catalog record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Thumbnail,
    Video,
}

impl MediaKind {
    /// Name of the multipart form field carrying the payload.
    pub fn field_name(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Video => "video",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Video => "video",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> Video {
        Video {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            title: "Boots learns Rust".to_string(),
            description: "A bear tries borrow checking".to_string(),
            user_id: Uuid::new_v4(),
            thumbnail_url: None,
            video_url: None,
        }
    }

    #[test]
    fn test_with_media_url_replaces_only_target_field() {
        let video = sample_video();
        let now = Utc::now();
        let updated = video.with_media_url(
            MediaKind::Thumbnail,
            "http://localhost:8091/assets/abc.png".to_string(),
            now,
        );

        assert_eq!(updated.id, video.id);
        assert_eq!(updated.created_at, video.created_at);
        assert_eq!(updated.title, video.title);
        assert_eq!(updated.description, video.description);
        assert_eq!(updated.user_id, video.user_id);
        assert_eq!(updated.video_url, video.video_url);
        assert_eq!(
            updated.thumbnail_url.as_deref(),
            Some("http://localhost:8091/assets/abc.png")
        );
        assert_eq!(updated.updated_at, now);
    }

    #[test]
    fn test_with_media_url_video_leaves_thumbnail() {
        let mut video = sample_video();
        video.thumbnail_url = Some("http://localhost:8091/assets/t.jpg".to_string());
        let updated = video.with_media_url(
            MediaKind::Video,
            "https://reels.s3.us-east-2.amazonaws.com/other/x.mp4".to_string(),
            Utc::now(),
        );
        assert_eq!(updated.thumbnail_url, video.thumbnail_url);
        assert!(updated.video_url.is_some());
    }
}

//! Application state
//!
//! One immutable state value shared across handlers. The catalog, storage and
//! credential seams are trait objects so tests can swap in in-memory
//! implementations.

use reelvault_catalog::VideoCatalog;
use reelvault_core::models::MediaKind;
use reelvault_core::Config;
use reelvault_storage::MediaStore;
use std::sync::Arc;

use crate::auth::CredentialValidator;

pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4"];

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn VideoCatalog>,
    pub storage: Arc<dyn MediaStore>,
    pub credentials: Arc<dyn CredentialValidator>,
}

/// Per-media-kind upload limits and allow-list.
#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    pub max_size_bytes: usize,
    pub allowed_content_types: &'static [&'static str],
}

impl AppState {
    pub fn limits_for(&self, kind: MediaKind) -> MediaLimits {
        match kind {
            MediaKind::Thumbnail => MediaLimits {
                max_size_bytes: self.config.max_thumbnail_size_bytes,
                allowed_content_types: THUMBNAIL_CONTENT_TYPES,
            },
            MediaKind::Video => MediaLimits {
                max_size_bytes: self.config.max_video_size_bytes,
                allowed_content_types: VIDEO_CONTENT_TYPES,
            },
        }
    }
}

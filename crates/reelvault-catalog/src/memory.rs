//! In-memory catalog store for tests and local development

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reelvault_core::models::Video;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{CatalogResult, VideoCatalog};

/// Video catalog held in a process-local map.
#[derive(Clone, Default)]
pub struct MemoryVideoCatalog {
    inner: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl MemoryVideoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record (records are normally created by the catalog service,
    /// which is outside the upload pipeline).
    pub async fn insert(&self, video: Video) {
        self.inner.write().await.insert(video.id, video);
    }

    pub async fn remove(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }
}

#[async_trait]
impl VideoCatalog for MemoryVideoCatalog {
    async fn get_video(&self, id: Uuid) -> CatalogResult<Option<Video>> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn update_video(&self, video: &Video) -> CatalogResult<bool> {
        let mut guard = self.inner.write().await;
        match guard.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

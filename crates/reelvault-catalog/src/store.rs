//! Catalog store abstraction
//!
//! The upload pipeline loads a record before mutating it and writes the whole
//! record back. Updates are last-writer-wins; there is no optimistic locking.

use async_trait::async_trait;
use reelvault_core::models::Video;
use thiserror::Error;
use uuid::Uuid;

/// Catalog operation errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog record store.
///
/// Implementations must treat every field except the URL columns and
/// `updated_at` as immutable on update.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Load a record by id. `None` if it does not exist.
    async fn get_video(&self, id: Uuid) -> CatalogResult<Option<Video>>;

    /// Persist an updated record. Returns `false` if the record no longer
    /// exists (deleted between load and persist).
    async fn update_video(&self, video: &Video) -> CatalogResult<bool>;
}

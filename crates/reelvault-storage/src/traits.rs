//! Storage abstraction trait
//!
//! This module defines the `MediaStore` trait that all storage backends must
//! implement.

use async_trait::async_trait;
use reelvault_core::StorageBackend;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Media object store.
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// The upload pipeline works against this trait without coupling to backend
/// details.
///
/// **Key format:** `[orientation/]slug.ext`, produced by `keys::generate_object_key`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write the full content of `reader` under `key` and return the public
    /// URL of the stored object.
    ///
    /// The write is atomic with respect to the key: readers never observe a
    /// partially written object there. On failure nothing addressable remains
    /// under the key.
    ///
    /// `content_length` is the payload size when known. It is used for
    /// logging and for choosing between single-shot and multipart writes; the
    /// reader is always consumed until EOF regardless.
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

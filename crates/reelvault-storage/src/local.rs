use crate::traits::{MediaStore, StorageError, StorageResult};
use async_trait::async_trait;
use reelvault_core::StorageBackend;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncRead;

/// Local filesystem storage implementation
///
/// Objects are written to a temporary path next to the destination and moved
/// into place with a rename, so a file under the final key is always complete.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/reelvault/assets")
    /// * `base_url` - Base URL the files are served from (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// The storage key must not contain path traversal sequences that could
    /// escape the base storage directory. Keys come from
    /// `keys::generate_object_key` in normal operation, so a rejection here
    /// indicates a caller bug.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for LocalStore {
    async fn put(
        &self,
        key: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let tmp_path = path.with_extension(match path.extension() {
            Some(ext) => format!("{}.part", ext.to_string_lossy()),
            None => "part".to_string(),
        });
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let write_result: StorageResult<u64> = async {
            let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to sync file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?;

            fs::rename(&tmp_path, &path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move file into place at {}: {}",
                    path.display(),
                    e
                ))
            })?;

            Ok(bytes_copied)
        }
        .await;

        let bytes_copied = match write_result {
            Ok(n) => n,
            Err(e) => {
                // The final key must never hold a partial object.
                if let Err(cleanup_err) = fs::remove_file(&tmp_path).await {
                    if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %tmp_path.display(),
                            error = %cleanup_err,
                            "Failed to remove partial upload"
                        );
                    }
                }
                return Err(e);
            }
        };

        let url = self.generate_url(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

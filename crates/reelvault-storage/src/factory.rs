//! Storage factory
//!
//! Builds the configured `MediaStore` backend from application configuration.

use crate::local::LocalStore;
use crate::s3::S3Store;
use crate::traits::{MediaStore, StorageError, StorageResult};
use reelvault_core::{Config, StorageBackend};
use std::sync::Arc;

/// Create the storage backend named by `config.storage_backend`.
///
/// `Config::validate` has already checked that the backend-specific settings
/// are present; the errors here cover the unvalidated path.
pub async fn create_store(config: &Config) -> StorageResult<Arc<dyn MediaStore>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket = config.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError(
                    "S3_BUCKET must be set when using S3 storage backend".to_string(),
                )
            })?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend".to_string(),
                )
            })?;

            let store = S3Store::new(bucket.clone(), region.clone(), config.s3_endpoint.clone())
                .await?;

            tracing::info!(
                backend = "s3",
                bucket = %bucket,
                region = %region,
                endpoint = config.s3_endpoint.as_deref().unwrap_or("aws"),
                "Storage backend initialized"
            );

            Ok(Arc::new(store))
        }
        StorageBackend::Local => {
            let store =
                LocalStore::new(&config.assets_root, config.assets_base_url.clone()).await?;

            tracing::info!(
                backend = "local",
                root = %config.assets_root,
                base_url = %config.assets_base_url,
                "Storage backend initialized"
            );

            Ok(Arc::new(store))
        }
    }
}

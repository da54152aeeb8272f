use crate::traits::{MediaStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectStore, PutMultipartOptions, PutOptions, PutPayload,
    WriteMultipart,
};
use reelvault_core::StorageBackend;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Payloads at or below this size go up in a single PUT. Larger or
/// unknown-size payloads use a multipart upload so they never have to sit in
/// memory whole.
const SINGLE_PUT_MAX_BYTES: u64 = 8 * 1024 * 1024;

/// Part size for multipart uploads. S3 requires at least 5 MiB per part
/// except the last.
const MULTIPART_CHUNK_BYTES: usize = 10 * 1024 * 1024;

const MULTIPART_MAX_CONCURRENCY: usize = 8;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Store {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Store {
    /// Create a new S3Store instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID etc).
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Store {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn generate_url(&self, key: &str) -> String {
        object_url(&self.bucket, &self.region, self.endpoint_url.as_deref(), key)
    }

    async fn put_single(
        &self,
        location: &Path,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<u64> {
        let size = data.len() as u64;
        let bytes = Bytes::from(data);

        let mut opts = PutOptions::default();
        opts.attributes = content_attributes(content_type);

        self.store
            .put_opts(location, PutPayload::from(bytes), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("S3 put of {} failed: {}", key, e)))?;

        Ok(size)
    }

    async fn put_multipart_streaming(
        &self,
        location: &Path,
        key: &str,
        content_type: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let mut opts = PutMultipartOptions::default();
        opts.attributes = content_attributes(content_type);

        let upload = self
            .store
            .put_multipart_opts(location, opts)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("S3 multipart init failed: {}", e)))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_CHUNK_BYTES);

        let mut chunk = vec![0u8; 64 * 1024];
        let mut written: u64 = 0;

        loop {
            let n = match reader.read(&mut chunk).await {
                Ok(n) => n,
                Err(e) => {
                    abort_quietly(writer, &self.bucket, key).await;
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to read from stream: {}",
                        e
                    )));
                }
            };
            if n == 0 {
                break;
            }

            if let Err(e) = writer.wait_for_capacity(MULTIPART_MAX_CONCURRENCY).await {
                abort_quietly(writer, &self.bucket, key).await;
                return Err(StorageError::UploadFailed(format!(
                    "S3 multipart part upload failed: {}",
                    e
                )));
            }
            writer.write(&chunk[..n]);
            written += n as u64;
        }

        if let Err(e) = writer.finish().await {
            // finish() already aborted the upload on its own failure path, so
            // no parts remain addressable.
            return Err(StorageError::UploadFailed(format!(
                "S3 multipart completion failed: {}",
                e
            )));
        }

        Ok(written)
    }
}

/// Object attributes carrying the validated content type, so the stored
/// object is served with the right `Content-Type` header.
fn content_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    attributes
}

async fn abort_quietly(writer: WriteMultipart, bucket: &str, key: &str) {
    if let Err(e) = writer.abort().await {
        tracing::warn!(
            error = %e,
            bucket = %bucket,
            key = %key,
            "Failed to abort S3 multipart upload"
        );
    }
}

/// Public URL for an object.
///
/// AWS buckets use the virtual-hosted format
/// `https://{bucket}.s3.{region}.amazonaws.com/{key}`. S3-compatible providers
/// with a custom endpoint get path-style `{endpoint}/{bucket}/{key}` for
/// compatibility.
fn object_url(bucket: &str, region: &str, endpoint_url: Option<&str>, key: &str) -> String {
    match endpoint_url {
        Some(endpoint) => {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        }
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl MediaStore for S3Store {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result = match content_length {
            Some(len) if len <= SINGLE_PUT_MAX_BYTES => {
                let mut buffer = Vec::with_capacity(len as usize);
                reader.read_to_end(&mut buffer).await.map_err(|e| {
                    StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
                })?;
                self.put_single(&location, key, content_type, buffer).await
            }
            _ => {
                self.put_multipart_streaming(&location, key, content_type, reader)
                    .await
            }
        };

        let size = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            e
        })?;

        let url = self.generate_url(key);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::AttributeValue;

    #[test]
    fn test_content_type_attribute_is_set() {
        let attributes = content_attributes("video/mp4");
        assert_eq!(
            attributes.get(&Attribute::ContentType),
            Some(&AttributeValue::from("video/mp4"))
        );
    }

    #[test]
    fn test_aws_url_is_virtual_hosted() {
        let url = object_url("reels", "us-east-2", None, "portrait/abc.mp4");
        assert_eq!(
            url,
            "https://reels.s3.us-east-2.amazonaws.com/portrait/abc.mp4"
        );
    }

    #[test]
    fn test_custom_endpoint_url_is_path_style() {
        let url = object_url(
            "reels",
            "us-east-1",
            Some("http://localhost:9000/"),
            "abc.jpg",
        );
        assert_eq!(url, "http://localhost:9000/reels/abc.jpg");
    }
}

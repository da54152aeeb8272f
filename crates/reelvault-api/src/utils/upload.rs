//! Common utilities for file upload handlers
//!
//! Multipart payloads are consumed chunk by chunk. Small payloads stay in
//! memory; anything past the spool threshold is written to a temp file, so a
//! 1 GiB upload never has to fit in RAM. The size ceiling is enforced while
//! reading, before the payload is fully consumed.

use crate::state::MediaLimits;
use axum::extract::multipart::Field;
use axum::extract::Multipart;
use bytes::Bytes;
use reelvault_core::AppError;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Map a validated content type to the storage extension. Client filenames
/// are never consulted.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "video/mp4" => Some("mp4"),
        _ => None,
    }
}

/// Validate content type against the allow-list. Compares the normalized MIME
/// type only (no parameter bypass); matching is exact per RFC 6838 registered
/// names, which are lowercase.
pub fn validate_content_type(
    content_type: &str,
    allowed_types: &[&'static str],
) -> Result<&'static str, AppError> {
    let normalized = normalize_mime_type(content_type);
    allowed_types
        .iter()
        .find(|ct| normalized == **ct)
        .copied()
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "Invalid content type '{}'. Allowed types: {}",
                normalized,
                allowed_types.join(", ")
            ))
        })
}

enum PayloadInner {
    Memory(Bytes),
    Spooled { path: TempPath },
}

/// A fully received multipart payload, in memory or spooled to a temp file.
///
/// The temp file (when present) is deleted when the payload or its reader is
/// dropped.
pub struct SpooledPayload {
    content_type: &'static str,
    extension: &'static str,
    size_bytes: u64,
    inner: PayloadInner,
}

impl SpooledPayload {
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn extension(&self) -> &'static str {
        self.extension
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Materialize the payload at a filesystem path so external tools
    /// (ffprobe) can read it. In-memory payloads are staged to a temp file;
    /// spooled payloads already have one.
    pub async fn stage_to_file(&mut self) -> Result<&Path, AppError> {
        if let PayloadInner::Memory(bytes) = &self.inner {
            let temp = NamedTempFile::new()
                .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;
            let path = temp.into_temp_path();
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to stage payload: {}", e)))?;
            self.inner = PayloadInner::Spooled { path };
        }

        match &self.inner {
            PayloadInner::Spooled { path } => Ok(path),
            PayloadInner::Memory(_) => unreachable!("payload staged above"),
        }
    }

    /// Consume the payload into an async reader over its bytes.
    pub async fn into_reader(self) -> Result<PayloadReader, AppError> {
        let reader = match self.inner {
            PayloadInner::Memory(bytes) => PayloadReader {
                inner: ReaderInner::Memory(io::Cursor::new(bytes)),
                _tmp: None,
            },
            PayloadInner::Spooled { path } => {
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    AppError::Internal(format!("Failed to reopen spooled payload: {}", e))
                })?;
                PayloadReader {
                    inner: ReaderInner::File(file),
                    _tmp: Some(path),
                }
            }
        };
        Ok(reader)
    }
}

enum ReaderInner {
    Memory(io::Cursor<Bytes>),
    File(tokio::fs::File),
}

/// Async reader over a received payload. Holds the temp file alive until the
/// reader is dropped.
pub struct PayloadReader {
    inner: ReaderInner,
    _tmp: Option<TempPath>,
}

impl AsyncRead for PayloadReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            ReaderInner::Memory(cursor) => Pin::new(cursor).poll_read(cx, buf),
            ReaderInner::File(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

/// Read the media field named `field_name` from the multipart form.
///
/// The field's content type must be on the allow-list and its size must stay
/// within `limits.max_size_bytes`; the ceiling is checked as chunks arrive so
/// an oversized body is rejected without being stored anywhere. Other fields
/// in the form are ignored.
pub async fn read_media_field(
    mut multipart: Multipart,
    field_name: &str,
    limits: &MediaLimits,
    spool_threshold_bytes: usize,
) -> Result<SpooledPayload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let content_type = field.content_type().ok_or_else(|| {
            AppError::InvalidInput(format!("Missing Content-Type on '{}' field", field_name))
        })?;
        let content_type = validate_content_type(content_type, limits.allowed_content_types)?;
        // Allow-listed types always have a known extension.
        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::Internal(format!("No extension mapping for '{}'", content_type))
        })?;

        return read_field_body(field, content_type, extension, limits, spool_threshold_bytes)
            .await;
    }

    Err(AppError::InvalidInput(format!(
        "No '{}' file provided",
        field_name
    )))
}

async fn read_field_body(
    mut field: Field<'_>,
    content_type: &'static str,
    extension: &'static str,
    limits: &MediaLimits,
    spool_threshold_bytes: usize,
) -> Result<SpooledPayload, AppError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut spool: Option<(tokio::fs::File, TempPath)> = None;
    let mut total: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
    {
        total += chunk.len() as u64;
        if total > limits.max_size_bytes as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                limits.max_size_bytes / 1024 / 1024
            )));
        }

        match &mut spool {
            Some((file, _)) => {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to spool payload: {}", e)))?;
            }
            None => {
                buffer.extend_from_slice(&chunk);
                if buffer.len() > spool_threshold_bytes {
                    let temp = NamedTempFile::new().map_err(|e| {
                        AppError::Internal(format!("Failed to create temp file: {}", e))
                    })?;
                    let (std_file, path) = temp.into_parts();
                    let mut file = tokio::fs::File::from_std(std_file);
                    file.write_all(&buffer).await.map_err(|e| {
                        AppError::Internal(format!("Failed to spool payload: {}", e))
                    })?;
                    buffer = Vec::new();
                    spool = Some((file, path));
                }
            }
        }
    }

    if total == 0 {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }

    let inner = match spool {
        Some((mut file, path)) => {
            file.flush()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to spool payload: {}", e)))?;
            // File handle is dropped here; readers reopen via the path.
            PayloadInner::Spooled { path }
        }
        None => PayloadInner::Memory(Bytes::from(buffer)),
    };

    tracing::debug!(
        content_type = content_type,
        size_bytes = total,
        spooled = matches!(inner, PayloadInner::Spooled { .. }),
        "Received upload payload"
    );

    Ok(SpooledPayload {
        content_type,
        extension,
        size_bytes: total,
        inner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{THUMBNAIL_CONTENT_TYPES, VIDEO_CONTENT_TYPES};
    use tokio::io::AsyncReadExt;

    fn memory_payload(data: &[u8]) -> SpooledPayload {
        SpooledPayload {
            content_type: "video/mp4",
            extension: "mp4",
            size_bytes: data.len() as u64,
            inner: PayloadInner::Memory(Bytes::copy_from_slice(data)),
        }
    }

    #[test]
    fn test_validate_content_type_strips_parameters() {
        let ct = validate_content_type("image/jpeg; charset=utf-8", THUMBNAIL_CONTENT_TYPES);
        assert_eq!(ct.unwrap(), "image/jpeg");
    }

    #[test]
    fn test_validate_content_type_rejects_unlisted() {
        let err = validate_content_type("image/gif", THUMBNAIL_CONTENT_TYPES).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));

        let err = validate_content_type("video/webm", VIDEO_CONTENT_TYPES).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_validate_content_type_is_exact() {
        // MIME registered names are lowercase; no case folding.
        assert!(validate_content_type("Image/JPEG", THUMBNAIL_CONTENT_TYPES).is_err());
    }

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("video/mp4"), Some("mp4"));
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[tokio::test]
    async fn test_memory_payload_reader_roundtrip() {
        let payload = memory_payload(b"hello mp4");
        let mut reader = payload.into_reader().await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello mp4");
    }

    #[tokio::test]
    async fn test_stage_to_file_then_read() {
        let mut payload = memory_payload(b"probe me");
        let path = payload.stage_to_file().await.unwrap().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"probe me");

        // Staging must not consume the payload.
        let mut reader = payload.into_reader().await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"probe me");
    }

    #[tokio::test]
    async fn test_temp_file_removed_after_reader_drop() {
        let mut payload = memory_payload(b"ephemeral");
        let path = payload.stage_to_file().await.unwrap().to_path_buf();
        assert!(path.exists());

        let reader = payload.into_reader().await.unwrap();
        drop(reader);
        assert!(!path.exists());
    }
}

//! Video orientation probing
//!
//! Videos are prefixed by orientation so players can pick a layout from the
//! key alone. Orientation comes from the container's first video stream,
//! probed with ffprobe. Probing is advisory: any failure classifies the video
//! as `Other` and the upload proceeds.

use reelvault_core::AppError;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

/// Aspect-ratio classification of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// The storage key prefix for this orientation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

// Ratios within 1% of 16:9 or 9:16 count as that orientation, covering
// encoder rounding (e.g. 608x1080).
const RATIO_TOLERANCE: f64 = 0.01;

/// Classify pixel dimensions by aspect ratio. 16:9 is landscape, 9:16 is
/// portrait, everything else (squares, cinema ratios, zero dimensions) is
/// other.
pub fn classify_aspect(width: u32, height: u32) -> Orientation {
    if width == 0 || height == 0 {
        return Orientation::Other;
    }

    let ratio = width as f64 / height as f64;
    if (ratio - 16.0 / 9.0).abs() < RATIO_TOLERANCE {
        Orientation::Landscape
    } else if (ratio - 9.0 / 16.0).abs() < RATIO_TOLERANCE {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Read the pixel dimensions of the first video stream via ffprobe.
pub async fn probe_dimensions(ffprobe_path: &str, file: &Path) -> Result<(u32, u32), AppError> {
    // Dropping this future must not leave a detached ffprobe behind; the
    // temp file it reads is unlinked as soon as the request is gone.
    let output = Command::new(ffprobe_path)
        .kill_on_drop(true)
        .arg("-v")
        .arg("error")
        .arg("-print_format")
        .arg("json")
        .arg("-show_streams")
        .arg("-select_streams")
        .arg("v:0")
        .arg(file)
        .output()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Internal(format!(
            "ffprobe exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| AppError::Internal(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| AppError::Internal("No video stream in container".to_string()))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(AppError::Internal(
            "Video stream has no dimensions".to_string(),
        )),
    }
}

/// Classify a staged video file, falling back to `Other` when the container
/// cannot be probed.
pub async fn classify_video_file(ffprobe_path: &str, file: &Path) -> Orientation {
    match probe_dimensions(ffprobe_path, file).await {
        Ok((width, height)) => {
            let orientation = classify_aspect(width, height);
            tracing::debug!(
                width = width,
                height = height,
                orientation = orientation.as_str(),
                "Classified video"
            );
            orientation
        }
        Err(e) => {
            tracing::warn!(error = %e, "Video probe failed, classifying as other");
            Orientation::Other
        }
    }
}

//! Upload validation and media persistence
//!
//! Incoming multipart files are buffered and validated as a whole before
//! anything touches disk, so a rejected submission retains no partial
//! files. Acceptance is by declared content type only; the payload is not
//! sniffed. Accepted files land under the media root named by an
//! ingestion timestamp plus the original filename and are served back
//! read-only under the `/media/` prefix.

use anyhow::Result;
use axum::body::Bytes;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Per-file upload ceiling: 15 MiB
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// URL prefix under which stored media is served
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Media storage configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory where accepted uploads are persisted
    pub root: PathBuf,
}

impl MediaConfig {
    /// Create a new MediaConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_ROOT`: upload directory (default: `media`)
    pub fn from_env() -> Result<Self> {
        let root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        Ok(MediaConfig { root: root.into() })
    }
}

/// One file pulled out of a multipart submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Logical field name, `photos` or `video`
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Storage references returned for an accepted submission
#[derive(Debug, Clone, Default)]
pub struct StoredMedia {
    /// Photo references in upload order
    pub photos: Vec<String>,
    /// First video stream only
    pub video: Option<String>,
}

impl StoredMedia {
    /// True when the submission carried no media at all
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.video.is_none()
    }
}

/// Whether a declared content type is acceptable: any image type, or
/// exactly MPEG-4 video.
pub fn acceptable_media_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "video/mp4"
}

/// Strip any path components from a client-supplied filename.
fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.to_string()
    }
}

/// Validates and persists uploaded media
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a new media store rooted at the configured directory
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
        }
    }

    /// Directory accepted uploads are written to
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Validate a whole submission, then persist it.
    ///
    /// Rejection is atomic: if any file fails the size or type check the
    /// submission fails with `UnsupportedMedia` before anything is
    /// written. Photos keep their upload order; only the first video
    /// stream is kept.
    pub async fn store(&self, files: Vec<UploadedFile>) -> AppResult<StoredMedia> {
        for file in &files {
            if file.bytes.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::UnsupportedMedia(format!(
                    "{} exceeds the {} MiB upload limit",
                    file.filename,
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                )));
            }
            if !acceptable_media_type(&file.content_type) {
                return Err(AppError::UnsupportedMedia(format!(
                    "{} is not an accepted media type",
                    file.content_type
                )));
            }
        }

        let mut stored = StoredMedia::default();
        for file in files {
            match file.field.as_str() {
                "photos" => {
                    stored.photos.push(self.persist(&file).await?);
                }
                // Only the first video stream is kept
                "video" if stored.video.is_none() => {
                    stored.video = Some(self.persist(&file).await?);
                }
                _ => {}
            }
        }

        Ok(stored)
    }

    /// Write one accepted file under an ingestion-timestamp name and
    /// return its serving reference.
    async fn persist(&self, file: &UploadedFile) -> AppResult<String> {
        let name = format!(
            "{}-{}",
            Utc::now().timestamp_micros(),
            sanitize_filename(&file.filename)
        );
        let path = self.root.join(&name);

        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to persist upload {}: {}", name, e))?;

        info!(
            filename = %name,
            bytes = file.bytes.len(),
            "stored uploaded media"
        );

        Ok(format!("{}/{}", MEDIA_URL_PREFIX, name))
    }
}

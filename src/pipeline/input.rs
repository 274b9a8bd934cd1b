//! Input resolution: turn an [`ImageSource`] into validated image bytes.
//!
//! The OCR service accepts any common encoded image format, so the bytes are
//! not decoded here. The only checks are that a path is readable and that
//! the content is non-empty; both failures surface before any network call.

use crate::error::AdvisorError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the label photo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file on disk, read fully into memory.
    FromPath(PathBuf),
    /// Already-encoded image bytes (PNG, JPEG, …).
    FromBytes(Vec<u8>),
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::FromPath(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::FromPath(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::FromBytes(bytes)
    }
}

/// Load the image and reject empty content.
///
/// Bytes are returned exactly as read or given.
pub async fn load_image(source: ImageSource) -> Result<Vec<u8>, AdvisorError> {
    let bytes = match source {
        ImageSource::FromPath(path) => read_file(&path).await?,
        ImageSource::FromBytes(bytes) => bytes,
    };
    validate(bytes)
}

/// Reject empty image content.
pub fn validate(bytes: Vec<u8>) -> Result<Vec<u8>, AdvisorError> {
    if bytes.is_empty() {
        return Err(AdvisorError::EmptyImage);
    }
    Ok(bytes)
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AdvisorError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) => Err(match e.kind() {
            std::io::ErrorKind::NotFound => AdvisorError::ImageNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => AdvisorError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => AdvisorError::ImageReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        }),
    }
}

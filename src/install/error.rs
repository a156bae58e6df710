//! Installation error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures while fetching or unpacking assets
#[derive(Debug, Error)]
pub enum InstallError {
    /// The downloaded archive cannot be read as a zip file
    #[error("archive {} is corrupt or missing: {source}", .path.display())]
    ArchiveCorruptOrMissing {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    /// The download manager refused to start a transfer
    #[error("failed to start download of {url}: {reason}")]
    DownloadInitiation { url: String, reason: String },
    /// Filesystem failure while installing
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for installation operations
pub type InstallResult<T> = Result<T, InstallError>;

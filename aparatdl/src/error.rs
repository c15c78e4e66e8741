//! Error types for playlist downloads.
//!
//! Only [`DownloadError::CatalogUnavailable`] is fatal to a run. The other
//! variants are contained where they occur: a video without usable links is
//! skipped, a failed transfer is tallied as unsuccessful, and a corrupt ledger
//! is replaced by an empty one.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that can occur while resolving or downloading a playlist.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The remote catalog could not be reached or returned an unexpected shape.
    #[error("catalog unavailable at {url}: {reason}")]
    CatalogUnavailable { url: String, reason: String },

    /// A video advertises no quality links at all.
    #[error("no quality available for video {video}")]
    NoQualityAvailable { video: String },

    /// A single transfer failed.
    #[error("failed to download {url}: {reason}")]
    TransferFailed { url: String, reason: String },

    /// The history ledger could not be parsed.
    #[error("history ledger {} is corrupt: {reason}", path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    /// User-supplied input was rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Local filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl DownloadError {
    /// Build an [`DownloadError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CatalogUnavailable { .. } | Self::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_unavailable_display() {
        let err = DownloadError::CatalogUnavailable {
            url: "https://example.com/playlist".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "catalog unavailable at https://example.com/playlist: connection refused"
        );
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = DownloadError::io(
            "/tmp/history.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/history.json"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_fatality() {
        assert!(DownloadError::InvalidInput("x".to_string()).is_fatal());
        assert!(DownloadError::CatalogUnavailable {
            url: String::new(),
            reason: String::new(),
        }
        .is_fatal());
        assert!(!DownloadError::NoQualityAvailable {
            video: "v".to_string()
        }
        .is_fatal());
        assert!(!DownloadError::TransferFailed {
            url: String::new(),
            reason: String::new(),
        }
        .is_fatal());
    }
}

//! Resumable single-file transfers.
//!
//! This module provides:
//! - Byte sources with HTTP Range support (`source`)
//! - The resume-aware transfer engine (`engine`)
//!
//! # Architecture
//!
//! ```text
//! VideoTransfer (trait, scheduled by the orchestrator)
//!         │
//!         └── TransferEngine<S: ByteSource>
//!                 │
//!                 └── HttpSource (blocking reqwest, HEAD + ranged GET)
//! ```
//!
//! A transfer never raises: network and disk failures are logged with the
//! video title and reported as an unsuccessful [`TransferOutcome`].

mod engine;
mod source;

pub use engine::TransferEngine;
pub use source::{ByteSource, HttpSource, RemoteBody, DEFAULT_TIMEOUT_SECS};

use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback for a single transfer.
///
/// # Arguments
///
/// * `title` - Video title
/// * `percent` - Completion percentage (0.0 - 100.0)
/// * `bytes_so_far` - Bytes on disk, including any resumed prefix
/// * `total` - Expected size in bytes
///
/// Called once per chunk, from the transfer's worker thread.
pub type ProgressCallback = Arc<dyn Fn(&str, f64, u64, u64) + Send + Sync>;

/// One unit of work for the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
    pub title: String,
}

impl DownloadTask {
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            title: title.into(),
        }
    }
}

/// Result of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferOutcome {
    pub success: bool,
    /// Bytes written during this transfer (excludes a resumed prefix).
    pub bytes_written: u64,
}

impl TransferOutcome {
    pub fn succeeded(bytes_written: u64) -> Self {
        Self {
            success: true,
            bytes_written,
        }
    }

    pub fn failed(bytes_written: u64) -> Self {
        Self {
            success: false,
            bytes_written,
        }
    }
}

/// A blocking transfer of one task to disk.
pub trait VideoTransfer: Send + Sync {
    fn transfer(
        &self,
        task: &DownloadTask,
        on_progress: Option<&ProgressCallback>,
    ) -> TransferOutcome;
}

/// Completion percentage; 0 when the total is unknown.
pub fn percent_complete(bytes_so_far: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (bytes_so_far as f64 / total as f64) * 100.0
    }
}

//! Resume-aware transfer engine.
//!
//! Streams one URL to one file:
//! - A file whose size already matches the remote size is left untouched
//! - A shorter file is resumed with a Range request and appended to
//! - Anything else is downloaded from scratch

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, error, info};

use super::source::{ByteSource, HttpSource};
use super::{percent_complete, DownloadTask, ProgressCallback, TransferOutcome, VideoTransfer};
use crate::error::{DownloadError, DownloadResult};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Transfer engine over a [`ByteSource`].
#[derive(Debug)]
pub struct TransferEngine<S: ByteSource = HttpSource> {
    source: S,
}

impl TransferEngine<HttpSource> {
    /// Create an engine backed by HTTP with the default timeout.
    pub fn http() -> DownloadResult<Self> {
        Ok(Self::new(HttpSource::new()?))
    }
}

impl<S: ByteSource> TransferEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Download `task`, resuming a partial file when possible.
    ///
    /// Never fails: errors are logged with the video title and reported as an
    /// unsuccessful outcome.
    pub fn download(
        &self,
        task: &DownloadTask,
        progress: Option<&ProgressCallback>,
    ) -> TransferOutcome {
        let mut written = 0;
        match self.download_with_resume(task, progress, &mut written) {
            Ok(()) => TransferOutcome::succeeded(written),
            Err(e) => {
                error!(
                    video = %task.title,
                    bytes_written = written,
                    error = %e,
                    "Failed to download video"
                );
                TransferOutcome::failed(written)
            }
        }
    }

    /// `written` tracks bytes written by this call, including on failure.
    fn download_with_resume(
        &self,
        task: &DownloadTask,
        progress: Option<&ProgressCallback>,
        written: &mut u64,
    ) -> DownloadResult<()> {
        let dest = task.destination.as_path();

        let existing_size = if dest.exists() {
            dest.metadata().map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        // Unknown size degrades progress to byte counts
        let total_size = self.source.content_length(&task.url)?.unwrap_or(0);

        if self.check_existing_download(task, existing_size, total_size, progress) {
            return Ok(());
        }

        let offset = if existing_size > 0 && existing_size < total_size {
            info!(
                video = %task.title,
                offset = existing_size,
                total = total_size,
                "Resuming download"
            );
            existing_size
        } else {
            0
        };

        let body = self.source.open(&task.url, offset)?;
        if !body.is_success() {
            return Err(DownloadError::TransferFailed {
                url: task.url.clone(),
                reason: format!("GET request failed with status {}", body.status),
            });
        }

        // A server that ignores the Range header answers 200 with the full body
        let start_byte = if offset > 0 && body.is_partial() {
            offset
        } else {
            if offset > 0 {
                debug!(video = %task.title, "Server ignored range request, restarting");
            }
            0
        };

        let file = self.prepare_destination(dest, start_byte)?;
        self.stream_download(
            task,
            body.reader,
            file,
            start_byte,
            total_size,
            progress,
            written,
        )?;

        info!(
            video = %task.title,
            path = %dest.display(),
            bytes = *written,
            "Downloaded video"
        );
        Ok(())
    }

    /// Check if an existing file is already complete.
    fn check_existing_download(
        &self,
        task: &DownloadTask,
        existing_size: u64,
        total_size: u64,
        progress: Option<&ProgressCallback>,
    ) -> bool {
        if total_size == 0 || existing_size != total_size {
            return false;
        }

        info!(video = %task.title, "File already downloaded");
        if let Some(cb) = progress {
            cb(&task.title, 100.0, total_size, total_size);
        }
        true
    }

    /// Open the destination for appending at `start_byte`, or truncate it.
    fn prepare_destination(&self, dest: &Path, start_byte: u64) -> DownloadResult<File> {
        if start_byte > 0 {
            return OpenOptions::new()
                .append(true)
                .open(dest)
                .map_err(|e| DownloadError::io(dest, e));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::io(parent, e))?;
        }
        File::create(dest).map_err(|e| DownloadError::io(dest, e))
    }

    /// Stream the body to the destination file.
    ///
    /// A body that ends before `total_size` is an error; the bytes already
    /// written stay on disk as a resume point.
    #[allow(clippy::too_many_arguments)]
    fn stream_download(
        &self,
        task: &DownloadTask,
        mut reader: Box<dyn Read + Send>,
        file: File,
        start_byte: u64,
        total_size: u64,
        progress: Option<&ProgressCallback>,
        written: &mut u64,
    ) -> DownloadResult<()> {
        let dest = task.destination.as_path();
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = start_byte;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| DownloadError::TransferFailed {
                    url: task.url.clone(),
                    reason: format!("read error: {}", e),
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| DownloadError::io(dest, e))?;

            downloaded += bytes_read as u64;
            *written += bytes_read as u64;

            if let Some(cb) = progress {
                cb(
                    &task.title,
                    percent_complete(downloaded, total_size),
                    downloaded,
                    total_size,
                );
            }
        }

        writer.flush().map_err(|e| DownloadError::io(dest, e))?;

        if total_size > 0 && downloaded != total_size {
            return Err(DownloadError::TransferFailed {
                url: task.url.clone(),
                reason: format!(
                    "incomplete body: got {} of {} bytes",
                    downloaded, total_size
                ),
            });
        }

        Ok(())
    }
}

impl<S: ByteSource> VideoTransfer for TransferEngine<S> {
    fn transfer(
        &self,
        task: &DownloadTask,
        on_progress: Option<&ProgressCallback>,
    ) -> TransferOutcome {
        self.download(task, on_progress)
    }
}

//! Playlist download orchestration.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::{AparatClient, CatalogClient, PlaylistInfo};
use crate::config::DownloadConfig;
use crate::error::{DownloadError, DownloadResult};
use crate::ledger::{HistoryEntry, HistoryLedger};
use crate::naming::{disambiguated_video_filename, links_filename, playlist_directory};
use crate::quality::select_quality;
use crate::transfer::{DownloadTask, HttpSource, ProgressCallback, TransferEngine, VideoTransfer};

use super::scheduler::TransferScheduler;
use super::state::{RunState, RunSummary};

/// Downloader wired to the Aparat API and HTTP transfers.
pub type HttpPlaylistDownloader = PlaylistDownloader<AparatClient, TransferEngine<HttpSource>>;

/// Drives one playlist through catalog lookup, task building, transfers and
/// the history ledger.
///
/// Catalog and transfer implementations are blocking; the downloader runs
/// them on tokio's blocking pool, so its async methods must be awaited inside
/// a multi-threaded or current-thread tokio runtime.
pub struct PlaylistDownloader<C, T>
where
    C: CatalogClient + 'static,
    T: VideoTransfer + 'static,
{
    config: DownloadConfig,
    catalog: Arc<C>,
    transfer: Arc<T>,
    ledger: HistoryLedger,
    progress: Option<ProgressCallback>,
    cancellation: CancellationToken,
    state: RunState,
}

/// Tasks built for one run, with the number of videos skipped.
struct TaskPlan {
    tasks: Vec<DownloadTask>,
    links_written: usize,
    skipped: usize,
    interrupted: bool,
}

impl HttpPlaylistDownloader {
    /// Create a downloader using the HTTP catalog client and transfer engine.
    ///
    /// Builds blocking HTTP clients, so call this outside an async context.
    pub fn from_config(config: DownloadConfig) -> DownloadResult<Self> {
        let catalog = AparatClient::with_settings(config.api_base.clone(), config.api_timeout)?;
        let transfer = TransferEngine::new(HttpSource::with_timeout(config.timeout)?);
        Self::new(config, catalog, transfer)
    }
}

impl<C, T> PlaylistDownloader<C, T>
where
    C: CatalogClient + 'static,
    T: VideoTransfer + 'static,
{
    /// Create a downloader.
    ///
    /// Validates the configuration, creates the destination directory and
    /// loads the history ledger from it.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidInput`] for an invalid configuration and
    /// [`DownloadError::Io`] if the destination cannot be created.
    pub fn new(config: DownloadConfig, catalog: C, transfer: T) -> DownloadResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.destination)
            .map_err(|e| DownloadError::io(&config.destination, e))?;

        let ledger = HistoryLedger::load(HistoryLedger::default_path(&config.destination));

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            transfer: Arc::new(transfer),
            ledger,
            progress: None,
            cancellation: CancellationToken::new(),
            state: RunState::Idle,
        })
    }

    /// Report per-chunk progress for every transfer.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Use an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Fetch playlist metadata without transferring anything.
    pub async fn playlist_preview(&self) -> DownloadResult<PlaylistInfo> {
        let playlist_id = self.config.playlist_id.clone();
        self.on_catalog(move |catalog| catalog.fetch_playlist_info(&playlist_id))
            .await
    }

    /// Run the playlist and report overall success.
    ///
    /// Per-video failures do not fail the run. Returns `false` when the
    /// catalog is unreachable or the run was cancelled.
    pub async fn run_download(&mut self) -> bool {
        match self.run().await {
            Ok(summary) => summary.is_success(),
            Err(e) => {
                error!(playlist = %self.config.playlist_id, error = %e, "Playlist download failed");
                false
            }
        }
    }

    /// Run the playlist and return its tally.
    pub async fn run(&mut self) -> DownloadResult<RunSummary> {
        self.state = RunState::FetchingCatalog;
        let info = match self.playlist_preview().await {
            Ok(info) => info,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        let playlist_id = self.config.playlist_id.clone();
        let quality_key = self.config.quality.to_string();
        let mut summary = RunSummary::new(info.title.clone());

        if self.ledger.contains(&playlist_id, &quality_key) {
            info!(
                playlist = %info.title,
                quality = %quality_key,
                "Playlist already downloaded, skipping"
            );
            self.state = RunState::Done;
            summary.state = RunState::Done;
            summary.already_downloaded = true;
            summary.recorded = true;
            return Ok(summary);
        }

        info!(
            playlist = %info.title,
            videos = info.video_count(),
            quality = %quality_key,
            links_only = self.config.links_only,
            "Starting playlist"
        );

        self.state = RunState::BuildingTasks;
        let links_path = self
            .config
            .links_only
            .then(|| self.config.destination.join(links_filename(&info.title)));

        let plan = match self.build_tasks(&info, links_path.as_deref()).await {
            Ok(plan) => plan,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };
        summary.skipped = plan.skipped;
        summary.cancelled = plan.interrupted;
        summary.links_file = links_path;

        let recorded_count = if self.config.links_only {
            summary.total = plan.links_written;
            summary.successful = plan.links_written;
            info.video_count()
        } else {
            summary.total = plan.tasks.len();
            let task_count = plan.tasks.len();
            if !plan.interrupted {
                self.state = RunState::Transferring;
                let scheduler =
                    TransferScheduler::new(self.config.max_concurrent, self.cancellation.clone());
                let report = scheduler
                    .run(Arc::clone(&self.transfer), plan.tasks, self.progress.clone())
                    .await;

                for result in report.results.iter().filter(|r| r.outcome.success) {
                    summary.record_success(result.outcome.bytes_written);
                }
                summary.cancelled = report.not_started > 0 || self.cancellation.is_cancelled();
            }
            task_count
        };

        self.state = RunState::Finalizing;
        info!(
            playlist = %info.title,
            "Downloaded {}/{} videos successfully",
            summary.successful,
            summary.total
        );

        if summary.cancelled {
            warn!(playlist = %info.title, "Run cancelled, not recording in history");
            self.state = RunState::Failed;
            summary.state = RunState::Failed;
            return Ok(summary);
        }

        self.ledger.record(HistoryEntry::now(
            playlist_id,
            info.title.clone(),
            quality_key,
            recorded_count,
        ));
        match self.ledger.persist() {
            Ok(()) => summary.recorded = true,
            Err(e) => {
                error!(error = %e, "Failed to save download history");
                warn!(
                    playlist = %info.title,
                    "Run not saved to history; running it again will repeat the work"
                );
            }
        }

        self.state = RunState::Done;
        summary.state = RunState::Done;
        Ok(summary)
    }

    /// Resolve each video's links in playlist order.
    ///
    /// In links mode the chosen URL is appended to `links_path`; otherwise a
    /// transfer task is built. Videos whose links cannot be resolved are
    /// skipped.
    async fn build_tasks(
        &self,
        info: &PlaylistInfo,
        links_path: Option<&Path>,
    ) -> DownloadResult<TaskPlan> {
        let mut links_writer = match links_path {
            Some(path) => Some(open_links_file(path)?),
            None => None,
        };
        let playlist_dir = playlist_directory(&info.title);
        let video_dir = self.config.destination.join(playlist_dir);
        let mut planned: HashSet<PathBuf> = HashSet::new();

        let mut plan = TaskPlan {
            tasks: Vec::with_capacity(info.video_count()),
            links_written: 0,
            skipped: 0,
            interrupted: false,
        };

        for (index, video) in info.videos.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                plan.interrupted = true;
                break;
            }

            debug!(
                video = %video.title,
                "Resolving video {}/{}",
                index + 1,
                info.video_count()
            );

            let uid = video.uid.clone();
            let links = match self
                .on_catalog(move |catalog| catalog.fetch_video_links(&uid))
                .await
            {
                Ok(links) => links,
                Err(e) => {
                    error!(video = %video.title, error = %e, "Skipping video");
                    plan.skipped += 1;
                    continue;
                }
            };

            let selection = match select_quality(&links, self.config.quality, &video.title) {
                Ok(selection) => selection,
                Err(e) => {
                    error!(video = %video.title, error = %e, "Skipping video");
                    plan.skipped += 1;
                    continue;
                }
            };

            match (&mut links_writer, links_path) {
                (Some(writer), Some(path)) => {
                    if let Err(e) = writeln!(writer, "{}", selection.url()) {
                        error!(
                            video = %video.title,
                            error = %DownloadError::io(path, e),
                            "Skipping video"
                        );
                        plan.skipped += 1;
                        continue;
                    }
                    plan.links_written += 1;
                }
                _ => {
                    // Titles that sanitize alike must not share a file
                    let mut attempt = 0;
                    let destination = loop {
                        let candidate = video_dir.join(disambiguated_video_filename(
                            &video.title,
                            &video.uid,
                            selection.height_label(),
                            attempt,
                        ));
                        if planned.insert(candidate.clone()) {
                            break candidate;
                        }
                        attempt += 1;
                    };
                    if attempt > 0 {
                        warn!(
                            video = %video.title,
                            path = %destination.display(),
                            "File name already used in this playlist, renamed"
                        );
                    }
                    plan.tasks.push(DownloadTask::new(
                        selection.url(),
                        destination,
                        video.title.clone(),
                    ));
                }
            }
        }

        if let (Some(mut writer), Some(path)) = (links_writer, links_path) {
            writer.flush().map_err(|e| DownloadError::io(path, e))?;
            info!(path = %path.display(), links = plan.links_written, "Saved links");
        }

        Ok(plan)
    }

    /// Run a blocking catalog call on the blocking pool.
    async fn on_catalog<R, F>(&self, call: F) -> DownloadResult<R>
    where
        F: FnOnce(&C) -> DownloadResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let catalog = Arc::clone(&self.catalog);
        tokio::task::spawn_blocking(move || call(&catalog))
            .await
            .map_err(|e| DownloadError::CatalogUnavailable {
                url: self.config.api_base.clone(),
                reason: format!("catalog task failed: {}", e),
            })?
    }
}

fn open_links_file(path: &Path) -> DownloadResult<BufWriter<fs::File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DownloadError::io(path, e))?;
    Ok(BufWriter::new(file))
}

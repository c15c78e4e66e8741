//! Aparat playlist downloader.
//!
//! Resolves a playlist through the Aparat web API, picks one rendition per
//! video and downloads the files with resumable, bounded-concurrency
//! transfers. Completed `(playlist, quality)` runs are recorded in a history
//! ledger so repeated runs are skipped.
//!
//! # Example
//!
//! ```no_run
//! use aparatdl::{DownloadConfig, HttpPlaylistDownloader, Quality};
//!
//! # fn main() -> Result<(), aparatdl::DownloadError> {
//! let config = DownloadConfig::new("822374", Quality::Height(720), "./Downloads")?
//!     .with_max_concurrent(3);
//! let mut downloader = HttpPlaylistDownloader::from_config(config)?;
//!
//! let runtime = tokio::runtime::Runtime::new().expect("runtime");
//! let ok = runtime.block_on(downloader.run_download());
//! # let _ = ok;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod naming;
pub mod orchestrator;
pub mod quality;
pub mod transfer;

pub use catalog::{AparatClient, CatalogClient, PlaylistInfo, QualityLink, VideoRef};
pub use config::{ConfigFile, DownloadConfig};
pub use error::{DownloadError, DownloadResult};
pub use ledger::{HistoryEntry, HistoryLedger};
pub use orchestrator::{HttpPlaylistDownloader, PlaylistDownloader, RunState, RunSummary};
pub use quality::Quality;
pub use transfer::{
    DownloadTask, ProgressCallback, TransferEngine, TransferOutcome, VideoTransfer,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

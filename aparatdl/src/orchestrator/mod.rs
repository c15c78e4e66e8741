//! Playlist orchestration.
//!
//! This module provides:
//! - Run state and tallies (`state`)
//! - The bounded transfer scheduler (`scheduler`)
//! - The playlist downloader (`downloader`)
//!
//! # Run flow
//!
//! ```text
//! Idle → FetchingCatalog → BuildingTasks → Transferring → Finalizing → Done
//!             │                                                 │
//!             └── catalog unreachable ──────────→ Failed ←── cancelled
//! ```
//!
//! Catalog lookups run one at a time before any transfer starts. Transfers
//! run on the blocking pool, at most `max_concurrent` at once. Only the
//! downloader touches the ledger and the links file.

mod downloader;
mod scheduler;
mod state;

pub use downloader::{HttpPlaylistDownloader, PlaylistDownloader};
pub use scheduler::{ScheduleReport, TaskResult, TransferScheduler};
pub use state::{RunState, RunSummary};

//! Run state and summary for playlist downloads.

use std::fmt;
use std::path::PathBuf;

/// Stages of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// Fetching playlist metadata.
    FetchingCatalog,
    /// Resolving per-video links and building tasks.
    BuildingTasks,
    /// Transfers in flight.
    Transferring,
    /// Recording the run in the ledger.
    Finalizing,
    /// Run completed (or was already in the ledger).
    Done,
    /// Catalog unreachable or run cancelled.
    Failed,
}

impl RunState {
    /// Get a human-readable name for the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::FetchingCatalog => "Fetching playlist",
            Self::BuildingTasks => "Resolving videos",
            Self::Transferring => "Downloading",
            Self::Finalizing => "Finalizing",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tally of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub playlist_title: String,
    /// Terminal state of the run.
    pub state: RunState,
    /// Tasks scheduled (download mode) or links written (links mode).
    pub total: usize,
    /// Transfers that succeeded; equals `total` in links mode.
    pub successful: usize,
    /// Videos skipped while building tasks.
    pub skipped: usize,
    /// Bytes written by this run.
    pub bytes_written: u64,
    /// The ledger already held this playlist and quality.
    pub already_downloaded: bool,
    /// The run was cancelled before every task started.
    pub cancelled: bool,
    /// The history ledger on disk holds this playlist and quality. False
    /// after a failed save, in which case a rerun repeats the work.
    pub recorded: bool,
    /// Links file, in links mode.
    pub links_file: Option<PathBuf>,
}

impl RunSummary {
    pub(crate) fn new(playlist_title: impl Into<String>) -> Self {
        Self {
            playlist_title: playlist_title.into(),
            ..Default::default()
        }
    }

    /// Number of unsuccessful transfers.
    pub fn failed(&self) -> usize {
        self.total.saturating_sub(self.successful)
    }

    /// Whether the run counts as successful overall.
    ///
    /// Individual video failures do not fail the run; only a run that did not
    /// reach `Done` does.
    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    /// Get the progress as a percentage of tasks.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.successful as f64 / self.total as f64) * 100.0
        }
    }

    pub(crate) fn record_success(&mut self, bytes: u64) {
        self.successful += 1;
        self.bytes_written += bytes;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.already_downloaded {
            return write!(f, "'{}' was already downloaded", self.playlist_title);
        }
        write!(
            f,
            "{}/{} succeeded for '{}'",
            self.successful, self.total, self.playlist_title
        )?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        if self.cancelled {
            write!(f, " [cancelled]")?;
        } else if self.state == RunState::Done && !self.recorded {
            write!(f, " [not saved to history]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_names() {
        assert_eq!(RunState::Idle.name(), "Idle");
        assert_eq!(RunState::Transferring.to_string(), "Downloading");
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Finalizing.is_terminal());
        assert_eq!(RunState::default(), RunState::Idle);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new("Course");
        summary.total = 4;
        summary.record_success(100);
        summary.record_success(50);

        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.bytes_written, 150);
        assert_eq!(summary.progress_percent(), 50.0);
        assert!(!summary.is_success());

        summary.state = RunState::Done;
        assert!(summary.is_success());
    }

    #[test]
    fn test_summary_display() {
        let mut summary = RunSummary::new("Course");
        summary.total = 3;
        summary.successful = 2;
        summary.skipped = 1;
        assert_eq!(summary.to_string(), "2/3 succeeded for 'Course' (1 skipped)");

        summary.state = RunState::Done;
        summary.recorded = false;
        assert_eq!(
            summary.to_string(),
            "2/3 succeeded for 'Course' (1 skipped) [not saved to history]"
        );

        let already = RunSummary {
            already_downloaded: true,
            ..RunSummary::new("Course")
        };
        assert_eq!(already.to_string(), "'Course' was already downloaded");
    }

    #[test]
    fn test_empty_summary_progress() {
        assert_eq!(RunSummary::new("Empty").progress_percent(), 100.0);
    }
}

//! CLI error types.

use aparatdl::logging::LoggingError;
use aparatdl::DownloadError;
use thiserror::Error;

/// Errors surfaced by the `aparatdl` binary. Any of them exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// Interactive prompt failed or was aborted.
    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to start runtime: {0}")]
    Runtime(String),

    #[error("failed to set signal handler: {0}")]
    Signal(String),

    /// The run finished without reaching `Done`.
    #[error("download failed: {0}")]
    RunFailed(String),
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::Prompt(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_is_transparent() {
        let err: CliError =
            DownloadError::InvalidInput("playlist id must be numeric".into()).into();
        assert_eq!(err.to_string(), "invalid input: playlist id must be numeric");
    }

    #[test]
    fn test_run_failed_display() {
        let err = CliError::RunFailed("0/2 succeeded for 'Course' [cancelled]".to_string());
        assert_eq!(
            err.to_string(),
            "download failed: 0/2 succeeded for 'Course' [cancelled]"
        );
    }
}

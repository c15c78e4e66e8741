//! Configuration for playlist downloads.
//!
//! Two layers:
//! - [`DownloadConfig`]: the validated settings of one run
//! - [`ConfigFile`]: optional user defaults in `~/.aparatdl/config.ini`
//!
//! Callers resolve settings as: explicit value > config file > built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::catalog::DEFAULT_API_BASE;
use crate::error::{DownloadError, DownloadResult};
use crate::naming::extract_playlist_id;
use crate::quality::Quality;
use crate::transfer::DEFAULT_TIMEOUT_SECS;

/// Smallest accepted concurrency limit.
pub const MIN_CONCURRENT_DOWNLOADS: usize = 1;

/// Largest accepted concurrency limit.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 10;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENT_DOWNLOADS: usize = 3;

/// Default destination directory.
pub const DEFAULT_DESTINATION: &str = "./Downloads";

/// Default timeout for catalog requests in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Settings for one playlist run.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Numeric playlist id.
    pub playlist_id: String,

    /// Requested quality.
    pub quality: Quality,

    /// Directory that receives the playlist folder, links file, ledger and log.
    pub destination: PathBuf,

    /// Maximum simultaneous transfers, within
    /// [`MIN_CONCURRENT_DOWNLOADS`]..=[`MAX_CONCURRENT_DOWNLOADS`].
    pub max_concurrent: usize,

    /// Write a links file instead of downloading.
    pub links_only: bool,

    /// Timeout for video requests.
    pub timeout: Duration,

    /// Timeout for catalog requests.
    pub api_timeout: Duration,

    /// Base URL of the catalog API.
    pub api_base: String,
}

impl DownloadConfig {
    /// Create a configuration from raw playlist input (id or URL).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidInput`] if no numeric id can be extracted.
    pub fn new(
        playlist: &str,
        quality: Quality,
        destination: impl Into<PathBuf>,
    ) -> DownloadResult<Self> {
        Ok(Self {
            playlist_id: extract_playlist_id(playlist)?,
            quality,
            destination: destination.into(),
            max_concurrent: DEFAULT_CONCURRENT_DOWNLOADS,
            links_only: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Create a configuration from raw playlist and quality strings.
    pub fn from_input(
        playlist: &str,
        quality: &str,
        destination: impl Into<PathBuf>,
    ) -> DownloadResult<Self> {
        Self::new(playlist, quality.parse()?, destination)
    }

    /// Set the maximum concurrent transfers.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Enable or disable link-extraction mode.
    pub fn with_links_only(mut self, links_only: bool) -> Self {
        self.links_only = links_only;
        self
    }

    /// Set the timeout for video requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout for catalog requests.
    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Set the catalog API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Reject settings that must not reach the network.
    pub fn validate(&self) -> DownloadResult<()> {
        if self.playlist_id.is_empty() || !self.playlist_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(DownloadError::InvalidInput(format!(
                "playlist id must be numeric, got '{}'",
                self.playlist_id
            )));
        }

        if !(MIN_CONCURRENT_DOWNLOADS..=MAX_CONCURRENT_DOWNLOADS).contains(&self.max_concurrent) {
            return Err(DownloadError::InvalidInput(format!(
                "concurrent downloads must be between {} and {}, got {}",
                MIN_CONCURRENT_DOWNLOADS, MAX_CONCURRENT_DOWNLOADS, self.max_concurrent
            )));
        }

        if let Quality::Height(0) = self.quality {
            return Err(DownloadError::InvalidInput(
                "quality must be a positive number or 'auto'".to_string(),
            ));
        }

        Ok(())
    }
}

/// User defaults read from an INI file.
///
/// ```ini
/// [download]
/// quality = 720
/// destination = ~/Videos/aparat
/// concurrent = 3
/// timeout = 300
///
/// [api]
/// base_url = https://www.aparat.com/api/fa/v1
/// timeout = 30
///
/// [logging]
/// level = info
/// file = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub quality: Option<String>,
    pub destination: Option<PathBuf>,
    pub concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub api_base: Option<String>,
    pub api_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_to_file: Option<bool>,
}

/// Default location of the config file.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aparatdl").join("config.ini"))
}

impl ConfigFile {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> DownloadResult<Self> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> DownloadResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)
            .map_err(|e| DownloadError::InvalidInput(format!("{}: {}", path.display(), e)))?;

        let get = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_num = |section: &str, key: &str| -> DownloadResult<Option<u64>> {
            get(section, key)
                .map(|v| {
                    v.parse::<u64>().map_err(|_| {
                        DownloadError::InvalidInput(format!(
                            "{}.{} must be a number, got '{}'",
                            section, key, v
                        ))
                    })
                })
                .transpose()
        };

        Ok(Self {
            quality: get("download", "quality"),
            destination: get("download", "destination").map(|d| expand_tilde(&d)),
            concurrent: parse_num("download", "concurrent")?.map(|n| n as usize),
            timeout_secs: parse_num("download", "timeout")?,
            api_base: get("api", "base_url"),
            api_timeout_secs: parse_num("api", "timeout")?,
            log_level: get("logging", "level"),
            log_to_file: get("logging", "file").map(|v| parse_bool(&v)),
        })
    }

    /// Apply the file's timeouts and API base to a run configuration.
    pub fn apply(&self, mut config: DownloadConfig) -> DownloadConfig {
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.api_timeout_secs {
            config = config.with_api_timeout(Duration::from_secs(secs));
        }
        if let Some(ref base) = self.api_base {
            config = config.with_api_base(base.clone());
        }
        config
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

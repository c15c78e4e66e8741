//! Download history ledger.
//!
//! Records every completed `(playlist, quality)` run so a later run with the
//! same pair can be skipped. The ledger is a pretty-printed JSON object keyed
//! by a SHA-256 fingerprint of `"{playlist_id}_{quality}"`.
//!
//! The key uses the *requested* quality string. `auto` and `720` are therefore
//! distinct keys even when both resolve to the same files.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{DownloadError, DownloadResult};

/// File name of the ledger inside the destination directory.
pub const LEDGER_FILENAME: &str = ".download_history.json";

/// One completed playlist run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub playlist_id: String,
    pub title: String,
    pub quality: String,
    /// Completion time in seconds since the Unix epoch.
    pub timestamp_unix: i64,
    pub video_count: usize,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn now(
        playlist_id: impl Into<String>,
        title: impl Into<String>,
        quality: impl Into<String>,
        video_count: usize,
    ) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            title: title.into(),
            quality: quality.into(),
            timestamp_unix: chrono::Utc::now().timestamp(),
            video_count,
        }
    }
}

/// Persistent record of completed `(playlist, quality)` runs.
#[derive(Debug)]
pub struct HistoryLedger {
    path: PathBuf,
    entries: BTreeMap<String, HistoryEntry>,
}

impl HistoryLedger {
    /// Ledger path for a destination directory.
    pub fn default_path(destination: &Path) -> PathBuf {
        destination.join(LEDGER_FILENAME)
    }

    /// Create an empty ledger bound to `path` without touching the disk.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the ledger from `path`.
    ///
    /// A missing file yields an empty ledger. An unreadable or corrupt file
    /// also yields an empty ledger and logs a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::read_entries(&path) {
            Ok(Some(entries)) => {
                debug!(path = %path.display(), entries = entries.len(), "Loaded download history");
                Self { path, entries }
            }
            Ok(None) => Self::empty(path),
            Err(e) => {
                warn!(error = %e, "Could not load download history, starting empty");
                Self::empty(path)
            }
        }
    }

    fn read_entries(path: &Path) -> DownloadResult<Option<BTreeMap<String, HistoryEntry>>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DownloadError::LedgerCorrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| DownloadError::LedgerCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Fingerprint of a `(playlist, quality)` pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use aparatdl::ledger::HistoryLedger;
    ///
    /// let key = HistoryLedger::key("822374", "720");
    /// assert_eq!(key.len(), 64);
    /// assert_ne!(key, HistoryLedger::key("822374", "auto"));
    /// ```
    pub fn key(playlist_id: &str, quality: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}_{}", playlist_id, quality).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn contains(&self, playlist_id: &str, quality: &str) -> bool {
        self.entries.contains_key(&Self::key(playlist_id, quality))
    }

    pub fn get(&self, playlist_id: &str, quality: &str) -> Option<&HistoryEntry> {
        self.entries.get(&Self::key(playlist_id, quality))
    }

    /// Insert or replace the entry for the entry's `(playlist, quality)` pair.
    pub fn record(&mut self, entry: HistoryEntry) {
        let key = Self::key(&entry.playlist_id, &entry.quality);
        self.entries.insert(key, entry);
    }

    /// Write the full ledger to disk.
    ///
    /// Writes to a temporary file first, then renames over the ledger.
    pub fn persist(&self) -> DownloadResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::io(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let file = fs::File::create(&tmp).map_err(|e| DownloadError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &self.entries)
            .map_err(|e| DownloadError::io(&tmp, io::Error::other(e)))?;
        writer.flush().map_err(|e| DownloadError::io(&tmp, e))?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(|e| DownloadError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Saved download history");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries keyed by fingerprint.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &HistoryEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_is_sha256_of_joined_pair() {
        // SHA-256 of "822374_720"
        let mut hasher = Sha256::new();
        hasher.update(b"822374_720");
        let expected = format!("{:x}", hasher.finalize());

        assert_eq!(HistoryLedger::key("822374", "720"), expected);
        assert_ne!(
            HistoryLedger::key("822374", "720"),
            HistoryLedger::key("822374", "480")
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let ledger = HistoryLedger::load(temp.path().join(LEDGER_FILENAME));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LEDGER_FILENAME);
        fs::write(&path, "{ not json").unwrap();

        let ledger = HistoryLedger::load(&path);
        assert!(ledger.is_empty());
        assert_eq!(ledger.path(), path.as_path());
    }

    #[test]
    fn test_record_persist_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = HistoryLedger::default_path(temp.path());

        let mut ledger = HistoryLedger::load(&path);
        ledger.record(HistoryEntry::now("822374", "Rust Basics", "720", 12));
        ledger.persist().unwrap();

        let reloaded = HistoryLedger::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("822374", "720"));
        assert!(!reloaded.contains("822374", "auto"));

        let entry = reloaded.get("822374", "720").unwrap();
        assert_eq!(entry.title, "Rust Basics");
        assert_eq!(entry.video_count, 12);
        assert!(entry.timestamp_unix > 0);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_persisted_file_is_human_readable() {
        let temp = TempDir::new().unwrap();
        let mut ledger = HistoryLedger::empty(HistoryLedger::default_path(temp.path()));
        ledger.record(HistoryEntry::now("1", "T", "auto", 0));
        ledger.persist().unwrap();

        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert!(contents.contains('\n'));
        assert!(contents.contains("\"playlist_id\": \"1\""));
        assert!(contents.contains(&HistoryLedger::key("1", "auto")));
    }

    #[test]
    fn test_record_replaces_same_pair() {
        let mut ledger = HistoryLedger::empty("/unused/history.json");
        ledger.record(HistoryEntry::now("1", "Old", "720", 1));
        ledger.record(HistoryEntry::now("1", "New", "720", 2));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("1", "720").unwrap().title, "New");
    }
}

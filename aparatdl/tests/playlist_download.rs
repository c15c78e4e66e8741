//! End-to-end tests for playlist downloads.
//!
//! These tests drive `PlaylistDownloader` with the real `TransferEngine`,
//! a fake catalog and an in-memory byte source:
//! - Two-video playlist download and ledger record
//! - Idempotent reruns
//! - Resume of a partially downloaded file
//! - Catalog failure and quality fallback
//!
//! Run with: `cargo test --test playlist_download`

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use aparatdl::transfer::{ByteSource, RemoteBody};
use aparatdl::{
    CatalogClient, DownloadConfig, DownloadError, DownloadResult, HistoryLedger,
    PlaylistDownloader, PlaylistInfo, ProgressCallback, Quality, QualityLink, RunState,
    TransferEngine, VideoRef,
};

// ============================================================================
// Fakes
// ============================================================================

const PLAYLIST_ID: &str = "822374";

/// Catalog serving a fixed playlist; `None` simulates an unreachable API.
#[derive(Clone)]
struct StaticCatalog {
    playlist: Option<PlaylistInfo>,
    links: HashMap<String, Vec<QualityLink>>,
}

impl CatalogClient for StaticCatalog {
    fn fetch_playlist_info(&self, playlist_id: &str) -> DownloadResult<PlaylistInfo> {
        self.playlist
            .clone()
            .ok_or_else(|| DownloadError::CatalogUnavailable {
                url: format!("https://api.example.com/playlist/{}", playlist_id),
                reason: "connection refused".to_string(),
            })
    }

    fn fetch_video_links(&self, video_uid: &str) -> DownloadResult<Vec<QualityLink>> {
        Ok(self.links.get(video_uid).cloned().unwrap_or_default())
    }
}

/// In-memory byte source shared with the test through an `Arc`.
#[derive(Clone, Default)]
struct MemorySource {
    files: Arc<HashMap<String, Vec<u8>>>,
    requests: Arc<Mutex<Vec<(String, u64)>>>,
}

impl MemorySource {
    fn requests(&self) -> Vec<(String, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

impl ByteSource for MemorySource {
    fn content_length(&self, url: &str) -> DownloadResult<Option<u64>> {
        Ok(self.files.get(url).map(|f| f.len() as u64))
    }

    fn open(&self, url: &str, offset: u64) -> DownloadResult<RemoteBody> {
        let mut requests = self.requests.lock().unwrap();
        requests.push((url.to_string(), offset));
        match self.files.get(url) {
            Some(content) if offset > 0 => Ok(RemoteBody {
                status: 206,
                reader: Box::new(Cursor::new(content[offset as usize..].to_vec())),
            }),
            Some(content) => Ok(RemoteBody {
                status: 200,
                reader: Box::new(Cursor::new(content.clone())),
            }),
            None => Ok(RemoteBody {
                status: 404,
                reader: Box::new(Cursor::new(Vec::new())),
            }),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn url(uid: &str, profile: &str) -> String {
    format!("https://cdn.example.com/{}/{}.mp4", uid, profile)
}

/// Playlist "Rust Basics" with two videos, each offered at 720p and 480p.
fn fixture() -> (StaticCatalog, MemorySource) {
    let videos = [("uid1", "Intro"), ("uid2", "A/B: Test?")];
    let mut links = HashMap::new();
    let mut files = HashMap::new();

    for (seed, (uid, _)) in videos.iter().enumerate() {
        let mut offered = Vec::new();
        for (profile, len) in [("720p", 180_000), ("480p", 90_000)] {
            let url = url(uid, profile);
            files.insert(url.clone(), payload(len, seed as u8));
            offered.push(QualityLink {
                profile: profile.to_string(),
                urls: vec![url],
            });
        }
        links.insert(uid.to_string(), offered);
    }

    let catalog = StaticCatalog {
        playlist: Some(PlaylistInfo {
            title: "Rust Basics".to_string(),
            videos: videos
                .iter()
                .map(|(uid, title)| VideoRef {
                    uid: uid.to_string(),
                    title: title.to_string(),
                })
                .collect(),
        }),
        links,
    };
    let source = MemorySource {
        files: Arc::new(files),
        requests: Arc::default(),
    };
    (catalog, source)
}

fn config(temp: &TempDir, quality: Quality) -> DownloadConfig {
    DownloadConfig::new(PLAYLIST_ID, quality, temp.path())
        .unwrap()
        .with_max_concurrent(2)
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_two_video_playlist_end_to_end() {
    let temp = TempDir::new().unwrap();
    let (catalog, source) = fixture();

    let mut downloader = PlaylistDownloader::new(
        config(&temp, Quality::Height(720)),
        catalog,
        TransferEngine::new(source.clone()),
    )
    .unwrap();

    assert!(downloader.run_download().await);
    assert_eq!(downloader.state(), RunState::Done);

    let dir = temp.path().join("Rust Basics");
    assert_eq!(
        fs::read(dir.join("Intro-720p.mp4")).unwrap(),
        payload(180_000, 0)
    );
    assert_eq!(
        fs::read(dir.join("AB Test-720p.mp4")).unwrap(),
        payload(180_000, 1)
    );
    assert_eq!(source.requests().len(), 2);

    // The ledger on disk holds exactly one entry for (id, "720")
    let ledger = HistoryLedger::load(HistoryLedger::default_path(temp.path()));
    assert_eq!(ledger.len(), 1);
    let (key, entry) = ledger.entries().next().unwrap();
    assert_eq!(key, &HistoryLedger::key(PLAYLIST_ID, "720"));
    assert_eq!(entry.title, "Rust Basics");
    assert_eq!(entry.video_count, 2);
}

#[tokio::test]
async fn test_second_run_transfers_nothing() {
    let temp = TempDir::new().unwrap();
    let (catalog, source) = fixture();

    let mut first = PlaylistDownloader::new(
        config(&temp, Quality::Height(720)),
        catalog.clone(),
        TransferEngine::new(source.clone()),
    )
    .unwrap();
    assert!(first.run_download().await);
    let after_first = source.requests().len();

    let mut second = PlaylistDownloader::new(
        config(&temp, Quality::Height(720)),
        catalog,
        TransferEngine::new(source.clone()),
    )
    .unwrap();
    let summary = second.run().await.unwrap();

    assert!(summary.already_downloaded);
    assert!(summary.is_success());
    assert_eq!(source.requests().len(), after_first);
}

#[tokio::test]
async fn test_partial_file_resumes_with_single_range_request() {
    let temp = TempDir::new().unwrap();
    let (catalog, source) = fixture();

    let dir = temp.path().join("Rust Basics");
    fs::create_dir_all(&dir).unwrap();
    let full = payload(180_000, 0);
    fs::write(dir.join("Intro-720p.mp4"), &full[..50_000]).unwrap();

    let mut downloader = PlaylistDownloader::new(
        config(&temp, Quality::Height(720)),
        catalog,
        TransferEngine::new(source.clone()),
    )
    .unwrap();
    let summary = downloader.run().await.unwrap();

    assert_eq!(summary.successful, 2);
    assert_eq!(fs::read(dir.join("Intro-720p.mp4")).unwrap(), full);

    let intro_requests: Vec<u64> = source
        .requests()
        .into_iter()
        .filter(|(u, _)| u == &url("uid1", "720p"))
        .map(|(_, offset)| offset)
        .collect();
    assert_eq!(intro_requests, vec![50_000]);
}

#[tokio::test]
async fn test_catalog_failure_reports_false() {
    let temp = TempDir::new().unwrap();
    let (mut catalog, source) = fixture();
    catalog.playlist = None;

    let mut downloader = PlaylistDownloader::new(
        config(&temp, Quality::Height(720)),
        catalog,
        TransferEngine::new(source.clone()),
    )
    .unwrap();

    assert!(!downloader.run_download().await);
    assert_eq!(downloader.state(), RunState::Failed);
    assert!(source.requests().is_empty());
    assert!(!HistoryLedger::default_path(temp.path()).exists());
}

#[tokio::test]
async fn test_unavailable_quality_falls_back() {
    let temp = TempDir::new().unwrap();
    let (catalog, source) = fixture();

    let mut downloader = PlaylistDownloader::new(
        config(&temp, Quality::Height(1080)),
        catalog,
        TransferEngine::new(source),
    )
    .unwrap();
    let summary = downloader.run().await.unwrap();

    assert_eq!(summary.successful, 2);
    let dir = temp.path().join("Rust Basics");
    assert!(dir.join("Intro-720p.mp4").exists());
    assert!(dir.join("AB Test-720p.mp4").exists());
    assert!(downloader.ledger().contains(PLAYLIST_ID, "1080"));
}

#[tokio::test]
async fn test_progress_reaches_completion_per_video() {
    let temp = TempDir::new().unwrap();
    let (catalog, source) = fixture();

    let finished: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&finished);
    let progress: ProgressCallback =
        Arc::new(move |title: &str, percent: f64, bytes: u64, total: u64| {
            if percent >= 100.0 {
                assert_eq!(bytes, total);
                sink.lock().unwrap().push(title.to_string());
            }
        });

    let mut downloader = PlaylistDownloader::new(
        config(&temp, Quality::Height(480)),
        catalog,
        TransferEngine::new(source),
    )
    .unwrap()
    .with_progress(progress);
    assert!(downloader.run_download().await);

    let mut titles = finished.lock().unwrap().clone();
    titles.sort();
    assert_eq!(titles, vec!["A/B: Test?".to_string(), "Intro".to_string()]);
}

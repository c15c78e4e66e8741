//! Remote catalog access.
//!
//! Resolves a playlist id to its title and ordered videos, and a video uid to
//! the quality-labelled URLs it can be downloaded from.
//!
//! # Architecture
//!
//! ```text
//! CatalogClient (trait)
//!         │
//!         └── AparatClient (blocking reqwest, JSON schema in `schema`)
//! ```
//!
//! Every call is all-or-nothing: it either returns a complete value or
//! [`DownloadError::CatalogUnavailable`](crate::error::DownloadError). There
//! are no retries at this layer.

mod client;
mod schema;

pub use client::{AparatClient, DEFAULT_API_BASE};

use crate::error::{DownloadError, DownloadResult};
use schema::{PlaylistResponse, VideoResponse, VIDEO_ENTRY_TYPE};

/// One playable item within a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub uid: String,
    pub title: String,
}

/// Playlist metadata fetched once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub title: String,
    pub videos: Vec<VideoRef>,
}

impl PlaylistInfo {
    pub fn video_count(&self) -> usize {
        self.videos.len()
    }
}

/// A set of URLs for one encoded rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLink {
    /// Rendition label, e.g. `"720p"`.
    pub profile: String,
    /// Mirrors for the rendition; never empty.
    pub urls: Vec<String>,
}

/// Read-only access to the remote catalog.
///
/// Implementations are blocking; the orchestrator calls them from the
/// blocking thread pool.
pub trait CatalogClient: Send + Sync {
    /// Fetch the playlist title and its video entries, in playlist order.
    fn fetch_playlist_info(&self, playlist_id: &str) -> DownloadResult<PlaylistInfo>;

    /// Fetch every quality link advertised for a video.
    fn fetch_video_links(&self, video_uid: &str) -> DownloadResult<Vec<QualityLink>>;
}

/// Convert a playlist response into [`PlaylistInfo`].
///
/// Entries of other types are dropped. A video entry without a uid or title
/// is a shape mismatch and fails the whole response.
pub(crate) fn playlist_from_response(
    url: &str,
    response: PlaylistResponse,
) -> DownloadResult<PlaylistInfo> {
    let mut videos = Vec::new();

    for (index, entry) in response.included.into_iter().enumerate() {
        if entry.kind != VIDEO_ENTRY_TYPE {
            continue;
        }
        match (entry.attributes.uid, entry.attributes.title) {
            (Some(uid), Some(title)) => videos.push(VideoRef { uid, title }),
            _ => {
                return Err(DownloadError::CatalogUnavailable {
                    url: url.to_string(),
                    reason: format!("video entry {} is missing uid or title", index),
                })
            }
        }
    }

    Ok(PlaylistInfo {
        title: response.data.attributes.title,
        videos,
    })
}

/// Convert a video response into its quality links, dropping links without URLs.
pub(crate) fn links_from_response(response: VideoResponse) -> Vec<QualityLink> {
    response
        .data
        .attributes
        .file_link_all
        .into_iter()
        .filter(|link| !link.urls.is_empty())
        .map(|link| QualityLink {
            profile: link.profile,
            urls: link.urls,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://api.example.com/playlist";

    #[test]
    fn test_playlist_filters_non_video_entries() {
        let response: PlaylistResponse = serde_json::from_str(
            r#"{
                "data": {"attributes": {"title": "Course"}},
                "included": [
                    {"type": "Video", "attributes": {"uid": "a1", "title": "One"}},
                    {"type": "Playlist", "attributes": {"title": "Other"}},
                    {"type": "Video", "attributes": {"uid": "b2", "title": "Two"}}
                ]
            }"#,
        )
        .unwrap();

        let info = playlist_from_response(URL, response).unwrap();
        assert_eq!(info.title, "Course");
        assert_eq!(info.video_count(), 2);
        assert_eq!(info.videos[0].uid, "a1");
        assert_eq!(info.videos[1].title, "Two");
    }

    #[test]
    fn test_playlist_video_without_uid_fails_whole_response() {
        let response: PlaylistResponse = serde_json::from_str(
            r#"{
                "data": {"attributes": {"title": "Course"}},
                "included": [
                    {"type": "Video", "attributes": {"uid": "a1", "title": "One"}},
                    {"type": "Video", "attributes": {"title": "Broken"}}
                ]
            }"#,
        )
        .unwrap();

        let err = playlist_from_response(URL, response).unwrap_err();
        assert!(matches!(err, DownloadError::CatalogUnavailable { .. }));
    }

    #[test]
    fn test_links_drop_empty_url_sets() {
        let response: VideoResponse = serde_json::from_str(
            r#"{"data": {"attributes": {"file_link_all": [
                {"profile": "720p", "urls": []},
                {"profile": "480p", "urls": ["https://cdn.example.com/a.mp4"]}
            ]}}}"#,
        )
        .unwrap();

        let links = links_from_response(response);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].profile, "480p");
    }
}

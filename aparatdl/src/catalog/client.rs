//! Blocking HTTP client for the Aparat public API.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::schema::{PlaylistResponse, VideoResponse};
use super::{
    links_from_response, playlist_from_response, CatalogClient, PlaylistInfo, QualityLink,
};
use crate::error::{DownloadError, DownloadResult};

/// Base URL of the public API.
pub const DEFAULT_API_BASE: &str = "https://www.aparat.com/api/fa/v1";

/// Default timeout for catalog requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Catalog client backed by the Aparat REST API.
///
/// Uses `reqwest::blocking`; construct and drop it outside of an async
/// runtime.
#[derive(Debug)]
pub struct AparatClient {
    client: Client,
    base_url: String,
    pub(crate) timeout: Duration,
}

impl AparatClient {
    /// Create a client for the public API with the default timeout.
    pub fn new() -> DownloadResult<Self> {
        Self::with_settings(DEFAULT_API_BASE, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for a custom base URL and timeout.
    pub fn with_settings(base_url: impl Into<String>, timeout: Duration) -> DownloadResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DownloadError::CatalogUnavailable {
                url: base_url.clone(),
                reason: format!("failed to create HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn playlist_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/video/playlist/one/playlist_id/{}",
            self.base_url, playlist_id
        )
    }

    pub(crate) fn video_url(&self, video_uid: &str) -> String {
        format!("{}/video/video/show/videohash/{}", self.base_url, video_uid)
    }

    /// GET a URL and decode the JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> DownloadResult<T> {
        debug!(url = %url, "Fetching catalog metadata");

        let unavailable = |reason: String| DownloadError::CatalogUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                unavailable(format!("timed out after {}s", self.timeout.as_secs()))
            } else {
                unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!(
                "request failed with status {}",
                status
            )));
        }

        response
            .json::<T>()
            .map_err(|e| unavailable(format!("unexpected response: {}", e)))
    }
}

impl CatalogClient for AparatClient {
    fn fetch_playlist_info(&self, playlist_id: &str) -> DownloadResult<PlaylistInfo> {
        let url = self.playlist_url(playlist_id);
        let response: PlaylistResponse = self.get_json(&url)?;
        playlist_from_response(&url, response)
    }

    fn fetch_video_links(&self, video_uid: &str) -> DownloadResult<Vec<QualityLink>> {
        let url = self.video_url(video_uid);
        let response: VideoResponse = self.get_json(&url)?;
        Ok(links_from_response(response))
    }
}

//! Wire schema of the Aparat public API.
//!
//! Only the fields the downloader reads are modelled. Missing required fields
//! fail deserialization, which the client reports as `CatalogUnavailable`.

use serde::Deserialize;

/// Entry type of playable items in a playlist's `included` array.
pub const VIDEO_ENTRY_TYPE: &str = "Video";

/// `GET /video/playlist/one/playlist_id/{id}`
#[derive(Debug, Deserialize)]
pub struct PlaylistResponse {
    pub data: PlaylistData,
    #[serde(default)]
    pub included: Vec<IncludedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistData {
    pub attributes: PlaylistAttributes,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistAttributes {
    pub title: String,
}

/// One entry of `included`. Non-video entries carry unrelated attributes, so
/// everything here is optional and validated per entry type.
#[derive(Debug, Deserialize)]
pub struct IncludedEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: IncludedAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncludedAttributes {
    pub uid: Option<String>,
    pub title: Option<String>,
}

/// `GET /video/video/show/videohash/{uid}`
#[derive(Debug, Deserialize)]
pub struct VideoResponse {
    pub data: VideoData,
}

#[derive(Debug, Deserialize)]
pub struct VideoData {
    pub attributes: VideoAttributes,
}

#[derive(Debug, Deserialize)]
pub struct VideoAttributes {
    pub file_link_all: Vec<FileLink>,
}

#[derive(Debug, Deserialize)]
pub struct FileLink {
    pub profile: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

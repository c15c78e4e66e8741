//! Naming conventions for playlist input and output files.
//!
//! - Playlist ids pasted as bare numbers or full URLs
//! - Filesystem-safe video filenames (`{title}-{quality}p.mp4`)
//! - Links file names (`{playlist title}.txt`)

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{DownloadError, DownloadResult};

/// Extension used for every downloaded video.
pub const VIDEO_EXTENSION: &str = "mp4";

fn playlist_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:.*/)?(\d+)$").unwrap())
}

/// Extract the numeric playlist id from user input.
///
/// Accepts a bare id or a URL whose last path segment is the id. Query
/// strings, fragments and a trailing slash are ignored.
///
/// # Examples
///
/// ```
/// use aparatdl::naming::extract_playlist_id;
///
/// assert_eq!(extract_playlist_id("822374").unwrap(), "822374");
/// assert_eq!(
///     extract_playlist_id("https://www.aparat.com/playlist/822374").unwrap(),
///     "822374"
/// );
/// assert!(extract_playlist_id("not-a-playlist").is_err());
/// ```
pub fn extract_playlist_id(raw: &str) -> DownloadResult<String> {
    let trimmed = raw.trim();
    let without_suffix = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    playlist_id_pattern()
        .captures(without_suffix)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            DownloadError::InvalidInput(format!("playlist id must be numeric, got '{}'", raw))
        })
}

/// Strip everything except alphanumerics, space, hyphen and underscore.
///
/// # Examples
///
/// ```
/// use aparatdl::naming::sanitize_title;
///
/// assert_eq!(sanitize_title("A/B: Test?"), "AB Test");
/// assert_eq!(sanitize_title("  spaced_out-title  "), "spaced_out-title");
/// ```
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Filename for a downloaded video.
///
/// Falls back to `fallback` (normally the video uid) when the sanitized title
/// is empty.
///
/// # Examples
///
/// ```
/// use aparatdl::naming::video_filename;
///
/// assert_eq!(video_filename("A/B: Test?", "abc12", "720"), "AB Test-720p.mp4");
/// assert_eq!(video_filename("???", "abc12", "480"), "abc12-480p.mp4");
/// ```
pub fn video_filename(title: &str, fallback: &str, quality_label: &str) -> String {
    format!(
        "{}-{}p.{}",
        video_stem(title, fallback),
        quality_label,
        VIDEO_EXTENSION
    )
}

/// Filename for a video whose plain [`video_filename`] is already taken by
/// another video of the same playlist.
///
/// `attempt` 0 is the plain name, 1 adds the uid, and later attempts also
/// add a counter.
///
/// # Examples
///
/// ```
/// use aparatdl::naming::disambiguated_video_filename;
///
/// assert_eq!(
///     disambiguated_video_filename("Lesson: 1", "abc12", "720", 1),
///     "Lesson 1-abc12-720p.mp4"
/// );
/// assert_eq!(
///     disambiguated_video_filename("Lesson: 1", "abc12", "720", 3),
///     "Lesson 1-abc12-3-720p.mp4"
/// );
/// ```
pub fn disambiguated_video_filename(
    title: &str,
    uid: &str,
    quality_label: &str,
    attempt: usize,
) -> String {
    let stem = video_stem(title, uid);
    let uid = sanitize_title(uid);
    match attempt {
        0 => video_filename(title, &uid, quality_label),
        1 => format!("{}-{}-{}p.{}", stem, uid, quality_label, VIDEO_EXTENSION),
        n => format!(
            "{}-{}-{}-{}p.{}",
            stem, uid, n, quality_label, VIDEO_EXTENSION
        ),
    }
}

fn video_stem(title: &str, fallback: &str) -> String {
    let safe = sanitize_title(title);
    if safe.is_empty() {
        sanitize_title(fallback)
    } else {
        safe
    }
}

/// Filename of the links file written in link-extraction mode.
pub fn links_filename(playlist_title: &str) -> String {
    format!("{}.txt", playlist_directory(playlist_title))
}

/// Directory name for a playlist's videos.
///
/// Path separators are replaced so a title cannot escape the destination.
pub fn playlist_directory(playlist_title: &str) -> String {
    let name: String = playlist_title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            other => other,
        })
        .collect();
    let name = name.trim();

    match name {
        "" | "." | ".." => "playlist".to_string(),
        other => other.to_string(),
    }
}

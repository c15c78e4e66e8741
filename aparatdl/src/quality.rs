//! Quality selection for video renditions.
//!
//! A video advertises several [`QualityLink`]s (`"1080p"`, `"720p"`, ...).
//! [`select_quality`] picks exactly one of them for a requested [`Quality`].

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::catalog::QualityLink;
use crate::error::{DownloadError, DownloadResult};

/// Preference order used by the `auto` policy, best first.
pub const PREFERRED_HEIGHTS: [u32; 6] = [1080, 720, 480, 360, 240, 144];

/// Requested quality for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Best available rendition.
    Auto,
    /// A specific rendition height, e.g. `720` for `"720p"`.
    Height(u32),
}

impl Quality {
    /// Profile label as advertised by the catalog (`"720p"`).
    pub fn profile(&self) -> Option<String> {
        match self {
            Quality::Auto => None,
            Quality::Height(h) => Some(format!("{}p", h)),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Quality::Auto)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Height(720)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Auto => write!(f, "auto"),
            Quality::Height(h) => write!(f, "{}", h),
        }
    }
}

/// Parses `auto` or a bare height such as `720`.
///
/// The input is kept verbatim in the ledger key, so spellings that would map
/// to the same height (`720p`, `0720`) are rejected rather than normalized.
impl FromStr for Quality {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Quality::Auto);
        }
        let canonical =
            !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) && !s.starts_with('0');
        if !canonical {
            return Err(DownloadError::InvalidInput(format!(
                "quality must be a height such as 720 or 'auto', got '{}'",
                s
            )));
        }
        s.parse::<u32>()
            .map(Quality::Height)
            .map_err(|e| DownloadError::InvalidInput(format!("quality '{}': {}", s, e)))
    }
}

/// Outcome of quality selection for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The chosen link.
    pub link: QualityLink,
    /// Profile of the chosen link (`"720p"`).
    pub profile: String,
    /// True when an explicit request could not be honoured.
    pub fell_back: bool,
}

impl Selection {
    /// Profile without the trailing `p`, used in filenames.
    pub fn height_label(&self) -> &str {
        self.profile.strip_suffix('p').unwrap_or(&self.profile)
    }

    /// First URL of the chosen link.
    pub fn url(&self) -> &str {
        self.link.urls.first().map(String::as_str).unwrap_or_default()
    }
}

/// Pick one link from `links` for the requested quality.
///
/// `Auto` walks [`PREFERRED_HEIGHTS`] and falls back to the last link in
/// catalog order. An explicit height that is not advertised falls back to the
/// `Auto` policy and logs a warning.
///
/// # Errors
///
/// Returns [`DownloadError::NoQualityAvailable`] when `links` is empty.
pub fn select_quality(
    links: &[QualityLink],
    requested: Quality,
    video: &str,
) -> DownloadResult<Selection> {
    if let Some(wanted) = requested.profile() {
        if let Some(link) = links.iter().find(|l| l.profile == wanted) {
            return Ok(Selection {
                link: link.clone(),
                profile: wanted,
                fell_back: false,
            });
        }
    }

    let Some(link) = best_available(links) else {
        return Err(DownloadError::NoQualityAvailable {
            video: video.to_string(),
        });
    };
    let fell_back = !requested.is_auto();
    if fell_back {
        warn!(
            video = %video,
            requested = %requested,
            selected = %link.profile,
            "Requested quality not available, using best available"
        );
    }

    Ok(Selection {
        link: link.clone(),
        profile: link.profile.clone(),
        fell_back,
    })
}

fn best_available(links: &[QualityLink]) -> Option<&QualityLink> {
    PREFERRED_HEIGHTS
        .iter()
        .find_map(|h| {
            let profile = format!("{}p", h);
            links.iter().find(|l| l.profile == profile)
        })
        .or_else(|| links.last())
}

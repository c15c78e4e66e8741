//! Interactive prompts used when no playlist id is given.

use aparatdl::naming::extract_playlist_id;
use aparatdl::{PlaylistInfo, Quality};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

use crate::error::CliError;

/// Number of videos listed in a preview.
pub const PREVIEW_LIMIT: usize = 10;

/// Answers collected from the interactive session.
#[derive(Debug, Clone)]
pub struct PromptAnswers {
    pub playlist: String,
    pub quality: String,
    pub destination: String,
    pub links_only: bool,
    pub preview: bool,
}

/// Ask for every run setting, offering the resolved defaults.
pub fn ask_run_settings(
    default_quality: &str,
    default_destination: &str,
) -> Result<PromptAnswers, CliError> {
    let theme = ColorfulTheme::default();

    let playlist: String = Input::with_theme(&theme)
        .with_prompt("Playlist ID or URL")
        .validate_with(|input: &String| -> Result<(), String> {
            extract_playlist_id(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let quality: String = Input::with_theme(&theme)
        .with_prompt("Quality (e.g. 720, 1080 or auto)")
        .default(default_quality.to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            input
                .parse::<Quality>()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let destination: String = Input::with_theme(&theme)
        .with_prompt("Download directory")
        .default(default_destination.to_string())
        .interact_text()?;

    let links_only = Confirm::with_theme(&theme)
        .with_prompt("Only extract download links?")
        .default(false)
        .interact()?;

    let preview = Confirm::with_theme(&theme)
        .with_prompt("Preview the playlist before downloading?")
        .default(false)
        .interact()?;

    Ok(PromptAnswers {
        playlist,
        quality,
        destination,
        links_only,
        preview,
    })
}

/// Print the playlist title, size and first videos.
pub fn print_preview(info: &PlaylistInfo) {
    print!("{}", render_preview(info));
}

/// Ask whether to go ahead with the download after a preview.
pub fn confirm_download() -> Result<bool, CliError> {
    let proceed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Continue with download?")
        .default(true)
        .interact()?;
    Ok(proceed)
}

fn render_preview(info: &PlaylistInfo) -> String {
    let mut out = format!(
        "\nPlaylist: {}\nVideos:   {}\n\n",
        info.title,
        info.video_count()
    );
    for (i, video) in info.videos.iter().take(PREVIEW_LIMIT).enumerate() {
        out.push_str(&format!("  {:>2}. {}\n", i + 1, video.title));
    }
    if info.video_count() > PREVIEW_LIMIT {
        out.push_str(&format!(
            "  ... and {} more\n",
            info.video_count() - PREVIEW_LIMIT
        ));
    }
    out.push('\n');
    out
}

//! aparatdl - download Aparat playlists from the command line.

mod error;
mod progress;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use aparatdl::config::{ConfigFile, DEFAULT_CONCURRENT_DOWNLOADS, DEFAULT_DESTINATION};
use aparatdl::logging::{init_logging, LoggingOptions};
use aparatdl::{DownloadConfig, HttpPlaylistDownloader, Quality};
use clap::{Parser, ValueEnum};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CliError;
use crate::progress::ProgressReporter;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "aparatdl")]
#[command(version = aparatdl::VERSION)]
#[command(about = "Download Aparat playlists with resumable, concurrent transfers")]
#[command(long_about = None)]
struct Args {
    /// Aparat playlist ID or full URL (prompts interactively when omitted)
    #[arg(short = 'p', long)]
    playlist_id: Option<String>,

    /// Video quality: a height such as 720, or "auto" [default: 720]
    #[arg(short, long)]
    quality: Option<String>,

    /// Destination directory [default: ./Downloads]
    #[arg(short = 'o', long)]
    destination: Option<PathBuf>,

    /// Write a .txt file with download links instead of downloading
    #[arg(short, long)]
    links_only: bool,

    /// Number of simultaneous downloads, 1-10 [default: 3]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=10))]
    concurrent: Option<u8>,

    /// Show playlist information and confirm before downloading
    #[arg(long)]
    preview: bool,

    /// Log level [default: info]
    #[arg(long, value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,

    /// Do not write downloader.log in the destination directory
    #[arg(long)]
    no_log_file: bool,

    /// Downloads always resume; accepted for compatibility
    #[arg(long, hide = true)]
    resume: bool,
}

/// Settings for one invocation after merging flags, config file and prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    playlist: String,
    quality: String,
    destination: PathBuf,
    concurrent: usize,
    links_only: bool,
    preview: bool,
    log_level: String,
    log_to_file: bool,
}

impl RunSettings {
    /// Merge flags over config-file defaults. Flags win.
    fn resolve(args: &Args, file: &ConfigFile, playlist: String) -> Self {
        Self {
            playlist,
            quality: args
                .quality
                .clone()
                .or_else(|| file.quality.clone())
                .unwrap_or_else(|| Quality::default().to_string()),
            destination: args
                .destination
                .clone()
                .or_else(|| file.destination.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION)),
            concurrent: args
                .concurrent
                .map(usize::from)
                .or(file.concurrent)
                .unwrap_or(DEFAULT_CONCURRENT_DOWNLOADS),
            links_only: args.links_only,
            preview: args.preview,
            log_level: args
                .log_level
                .map(|l| l.as_str().to_string())
                .or_else(|| file.log_level.clone())
                .unwrap_or_else(|| "info".to_string()),
            log_to_file: !args.no_log_file && file.log_to_file.unwrap_or(true),
        }
    }

    /// Links mode previews without asking; nothing is downloaded anyway.
    fn confirms_after_preview(&self) -> bool {
        self.preview && !self.links_only
    }

    fn download_config(&self, file: &ConfigFile) -> Result<DownloadConfig, CliError> {
        let config = DownloadConfig::from_input(&self.playlist, &self.quality, &self.destination)?
            .with_max_concurrent(self.concurrent)
            .with_links_only(self.links_only);
        let config = file.apply(config);
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let args = Args::parse();
    let file = ConfigFile::load()?;

    let settings = match args.playlist_id.clone() {
        Some(playlist) => RunSettings::resolve(&args, &file, playlist),
        None => {
            let defaults = RunSettings::resolve(&args, &file, String::new());
            let destination = defaults.destination.to_string_lossy();
            let answers = prompt::ask_run_settings(&defaults.quality, &destination)?;
            RunSettings {
                playlist: answers.playlist,
                quality: answers.quality,
                destination: PathBuf::from(answers.destination),
                links_only: answers.links_only,
                preview: answers.preview,
                ..defaults
            }
        }
    };

    // Validate before anything touches the disk or the network
    let config = settings.download_config(&file)?;

    let logging = LoggingOptions::default()
        .with_level_str(&settings.log_level)?
        .with_log_dir(settings.log_to_file.then(|| settings.destination.clone()));
    let _log_guard = init_logging(&logging)?;
    debug!(?settings, "Resolved settings");
    if args.resume {
        debug!("Downloads always resume; --resume has no effect");
    }

    let token = CancellationToken::new();
    let reporter = ProgressReporter::new();

    // Blocking HTTP clients must be created outside the async runtime
    let mut downloader = HttpPlaylistDownloader::from_config(config)?
        .with_cancellation(token.clone())
        .with_progress(reporter.callback());

    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Cancelling: waiting for running downloads to finish...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    if settings.preview {
        let info = runtime.block_on(downloader.playlist_preview())?;
        prompt::print_preview(&info);
        if settings.confirms_after_preview() && !prompt::confirm_download()? {
            println!("Download cancelled.");
            return Ok(());
        }
    }

    let result = runtime.block_on(downloader.run());
    reporter.finish();
    let summary = result?;

    println!();
    if summary.already_downloaded {
        println!(
            "'{}' was already downloaded at quality {}.",
            summary.playlist_title, settings.quality
        );
    } else if let Some(ref links) = summary.links_file {
        println!("Saved {} links to {}", summary.successful, links.display());
    } else {
        let tally = format!("{}/{}", summary.successful, summary.total);
        let tally = if summary.failed() == 0 {
            style(tally).green()
        } else {
            style(tally).yellow()
        };
        println!(
            "Downloaded {} videos of '{}'",
            tally, summary.playlist_title
        );
        if summary.skipped > 0 {
            let skipped = format!("Skipped {} videos without usable links", summary.skipped);
            println!("{}", style(skipped).yellow());
        }
    }

    if !summary.is_success() {
        return Err(CliError::RunFailed(summary.to_string()));
    }
    if !summary.recorded {
        let warning = "Warning: download history was not saved; a rerun repeats this download";
        eprintln!("{}", style(warning).yellow());
    }
    info!(playlist = %summary.playlist_title, "Finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("aparatdl").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let args = parse(&["-p", "822374"]);
        let settings = RunSettings::resolve(&args, &ConfigFile::default(), "822374".into());

        assert_eq!(settings.quality, "720");
        assert_eq!(settings.destination, PathBuf::from("./Downloads"));
        assert_eq!(settings.concurrent, 3);
        assert_eq!(settings.log_level, "info");
        assert!(settings.log_to_file);
        assert!(!settings.links_only);
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = ConfigFile {
            quality: Some("480".into()),
            destination: Some(PathBuf::from("/data")),
            concurrent: Some(5),
            log_level: Some("debug".into()),
            log_to_file: Some(true),
            ..Default::default()
        };

        let from_file = RunSettings::resolve(&parse(&[]), &file, "1".into());
        assert_eq!(from_file.quality, "480");
        assert_eq!(from_file.destination, PathBuf::from("/data"));
        assert_eq!(from_file.concurrent, 5);
        assert_eq!(from_file.log_level, "debug");

        let args = parse(&[
            "-q", "auto", "-o", "/srv", "-c", "8", "--log-level", "ERROR", "--no-log-file", "-l",
        ]);
        let flags = RunSettings::resolve(&args, &file, "1".into());
        assert_eq!(flags.quality, "auto");
        assert_eq!(flags.destination, PathBuf::from("/srv"));
        assert_eq!(flags.concurrent, 8);
        assert_eq!(flags.log_level, "error");
        assert!(!flags.log_to_file);
        assert!(flags.links_only);
    }

    #[test]
    fn test_concurrency_range_enforced() {
        let argv = |c: &'static str| ["aparatdl", "-p", "1", "-c", c];
        assert!(Args::try_parse_from(argv("0")).is_err());
        assert!(Args::try_parse_from(argv("11")).is_err());
        assert!(Args::try_parse_from(argv("10")).is_ok());
    }

    #[test]
    fn test_links_mode_preview_skips_confirmation() {
        let file = ConfigFile::default();

        let download = RunSettings::resolve(&parse(&["--preview"]), &file, "1".into());
        assert!(download.confirms_after_preview());

        let links = RunSettings::resolve(&parse(&["--preview", "-l"]), &file, "1".into());
        assert!(!links.confirms_after_preview());

        let no_preview = RunSettings::resolve(&parse(&[]), &file, "1".into());
        assert!(!no_preview.confirms_after_preview());
    }

    #[test]
    fn test_warning_alias() {
        let args = parse(&["--log-level", "warning"]);
        assert_eq!(args.log_level, Some(LogLevel::Warn));
    }

    #[test]
    fn test_download_config_validation() {
        let temp = TempDir::new().unwrap();
        let args = parse(&["-o", temp.path().to_str().unwrap()]);

        let file = ConfigFile::default();
        let url = "https://www.aparat.com/playlist/822374";

        let good = RunSettings::resolve(&args, &file, url.into());
        let config = good.download_config(&file).unwrap();
        assert_eq!(config.playlist_id, "822374");
        assert_eq!(config.quality, Quality::Height(720));

        let bad_id = RunSettings::resolve(&args, &file, "not-a-playlist".into());
        assert!(bad_id.download_config(&file).is_err());

        let bad_quality = RunSettings {
            quality: "720p".into(),
            ..good.clone()
        };
        assert!(bad_quality.download_config(&file).is_err());

        let bad_concurrency = RunSettings {
            concurrent: 20,
            ..good
        };
        assert!(bad_concurrency.download_config(&file).is_err());
    }
}

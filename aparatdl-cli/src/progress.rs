//! Terminal progress bars.
//!
//! One bar per video, created on the first progress report for its title.
//! Sizes the server does not report fall back to a byte counter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aparatdl::ProgressCallback;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} - {msg}";
const COUNTER_TEMPLATE: &str = "{spinner:.cyan} {bytes} @ {bytes_per_sec} - {msg}";

/// Maximum title width shown next to a bar.
const MAX_TITLE_CHARS: usize = 40;

/// Renders per-video progress with indicatif.
#[derive(Clone)]
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Arc<Mutex<HashMap<String, ProgressBar>>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Arc::default(),
        }
    }

    /// Callback to hand to the downloader.
    pub fn callback(&self) -> ProgressCallback {
        let reporter = self.clone();
        Arc::new(move |title: &str, _percent: f64, bytes: u64, total: u64| {
            reporter.update(title, bytes, total);
        })
    }

    fn update(&self, title: &str, bytes: u64, total: u64) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars
            .entry(title.to_string())
            .or_insert_with(|| self.multi.add(make_bar(title, total)));

        bar.set_position(bytes);
        if total > 0 && bytes >= total {
            bar.finish();
        }
    }

    /// Mark every remaining bar as finished.
    pub fn finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.values().filter(|b| !b.is_finished()) {
                bar.abandon();
            }
        }
    }

    #[cfg(test)]
    fn bar_count(&self) -> usize {
        self.bars.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn make_bar(title: &str, total: u64) -> ProgressBar {
    let (bar, template) = if total > 0 {
        (ProgressBar::new(total), BAR_TEMPLATE)
    } else {
        (ProgressBar::no_length(), COUNTER_TEMPLATE)
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("━━╌"));
    }
    bar.set_message(short_title(title));
    bar
}

fn short_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let mut short: String = title.chars().take(MAX_TITLE_CHARS - 1).collect();
    short.push('…');
    short
}

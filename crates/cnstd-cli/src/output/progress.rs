//! Download progress bars using indicatif.

use std::sync::{Mutex, PoisonError};

use cnstd_core::{ProgressEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";

/// Shows one progress bar per transfer on stderr.
pub struct DownloadProgress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl DownloadProgress {
    /// Creates a progress sink. With `quiet`, nothing is drawn.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn new_bar(name: String, total: Option<u64>) -> ProgressBar {
        let bar = total.map_or_else(ProgressBar::new_spinner, ProgressBar::new);
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(name);
        bar
    }
}

impl ProgressSink for DownloadProgress {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }
        let mut current = self.bar.lock().unwrap_or_else(PoisonError::into_inner);

        match event {
            ProgressEvent::Started { name, total } => {
                if let Some(old) = current.take() {
                    old.finish_and_clear();
                }
                *current = Some(Self::new_bar(name, total));
            }
            ProgressEvent::Advanced { downloaded, .. } => {
                if let Some(bar) = current.as_ref() {
                    bar.set_position(downloaded);
                }
            }
            ProgressEvent::Finished { name, bytes } => {
                if let Some(bar) = current.take() {
                    bar.finish_with_message(format!("{name} done"));
                }
                tracing::debug!("{name}: {bytes} bytes");
            }
            ProgressEvent::Failed { name, reason } => {
                if let Some(bar) = current.take() {
                    bar.abandon_with_message(format!("{name} failed"));
                }
                tracing::debug!("{name}: {reason}");
            }
            ProgressEvent::Skipped { name, reason } => {
                eprintln!("{name}: {reason}, skipping download");
            }
        }
    }
}

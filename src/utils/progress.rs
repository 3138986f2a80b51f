//! Progress bar for batch runs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar with the standard batch styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{msg:30} [{bar:40.cyan/blue}] {pos:>4}/{len:4} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━─");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Visible bar when `show` is set, otherwise one that draws nothing
pub fn batch_progress(total: u64, show: bool) -> ProgressBar {
    if show {
        create_progress_bar(total, "Ingesting taxa")
    } else {
        ProgressBar::hidden()
    }
}

// src/progress.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner-style progress bar counting processed lines. The total is
/// unknown up front, so the bar reports position and throughput only.
pub fn line_progress(label: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template(
            "{prefix:.bold.dim} {spinner:.green} [{elapsed_precise}] {pos} lines ({per_sec}) {msg}",
        )
        .unwrap(),
    );
    bar.set_prefix(label.into());
    bar.enable_steady_tick(Duration::from_millis(75));
    bar
}

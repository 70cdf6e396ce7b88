//! Spinner helpers built on indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// A ticking spinner for a discovery step of unknown length.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .tick_strings(TICKS)
        .template("  {spinner:.cyan} {msg}")
        .expect("valid template");
    let pb = ProgressBar::new_spinner().with_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Stop `pb` and leave a `✓ msg` line in its place.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    let style = ProgressStyle::default_spinner()
        .template("  {prefix:.green} {msg}")
        .expect("valid template");
    pb.set_style(style);
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Stop `pb` and erase its line.
pub fn abandon(pb: &ProgressBar) {
    pb.finish_and_clear();
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use lazy_static::lazy_static;

lazy_static! {
    /// Shared bar for per-file loops, hidden between loops. Log output
    /// should be routed through it while it is visible so messages don't
    /// tear the bar.
    pub static ref PROGRESS_BAR: ProgressBar = ProgressBar::hidden();
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})")
        .unwrap()
        .progress_chars("=> ")
}

fn configure(bar: &ProgressBar, len: u64, msg: &'static str) {
    bar.reset();
    bar.set_style(bar_style());
    bar.set_message(msg);
    bar.set_length(len);
    bar.set_draw_target(ProgressDrawTarget::stderr());
}

/// Point the shared bar at stderr and size it for a new loop.
pub fn start(len: u64, msg: &'static str) -> ProgressBar {
    let bar = PROGRESS_BAR.clone();
    configure(&bar, len, msg);
    bar
}

/// Hide the shared bar once the loop is done so plain stderr logging
/// resumes.
pub fn finish() {
    PROGRESS_BAR.finish_and_clear();
    PROGRESS_BAR.set_draw_target(ProgressDrawTarget::hidden());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_and_hide() {
        let bar = ProgressBar::hidden();
        configure(&bar, 5, "files");
        assert_eq!(bar.length(), Some(5));
        bar.finish_and_clear();
        bar.set_draw_target(ProgressDrawTarget::hidden());
        assert!(bar.is_hidden());
    }
}

//! Animated spinner for the upload loading indicator.
//!
//! Renders on the current line of stdout. The detail text after the label
//! (upload progress) can be swapped while the spinner runs.

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Spinner animation frames.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner configuration.
#[derive(Clone)]
pub struct SpinnerConfig {
    /// Animation frames.
    pub frames: Vec<&'static str>,
    /// Frame duration in milliseconds.
    pub interval_ms: u64,
    pub color: Color,
    /// Whether to render the detail text after the label.
    pub show_detail: bool,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        Self {
            frames: SPINNER_FRAMES.to_vec(),
            interval_ms: 80,
            color: Color::Cyan,
            show_detail: true,
        }
    }
}

/// A spinner handle for controlling the animation.
pub struct SpinnerHandle {
    stop_tx: watch::Sender<bool>,
    detail_tx: watch::Sender<String>,
    task: Option<tokio::task::JoinHandle<()>>,
    is_paused: Arc<AtomicBool>,
}

impl SpinnerHandle {
    /// Replace the detail text shown after the label.
    pub fn set_detail(&self, detail: impl Into<String>) {
        let _ = self.detail_tx.send(detail.into());
    }

    /// Pause the spinner and clear its line so other output can be printed.
    pub fn pause(&self) {
        if !self.is_paused.swap(true, Ordering::Relaxed) {
            clear_line();
        }
    }

    pub fn resume(&self) {
        self.is_paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Relaxed)
    }

    /// Stop the spinner and wait for its task.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        clear_line();
        let _ = stdout().execute(Show);
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        let _ = stdout().execute(Show);
    }
}

fn clear_line() {
    let mut stdout = stdout();
    let _ = stdout.execute(MoveToColumn(0));
    let _ = stdout.execute(Clear(ClearType::CurrentLine));
    let _ = stdout.flush();
}

/// Spinner for showing activity.
pub struct Spinner {
    config: SpinnerConfig,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            config: SpinnerConfig::default(),
        }
    }

    pub fn with_config(config: SpinnerConfig) -> Self {
        Self { config }
    }

    /// Start the spinner with a label.
    pub fn start(&self, label: impl Into<String>) -> SpinnerHandle {
        let config = self.config.clone();
        let label = label.into();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (detail_tx, detail_rx) = watch::channel(String::new());
        let is_paused = Arc::new(AtomicBool::new(false));
        let is_paused_clone = is_paused.clone();

        let task = tokio::spawn(async move {
            let mut frame_idx = 0;
            let mut stdout = stdout();

            let _ = stdout.execute(Hide);

            loop {
                if *stop_rx.borrow() {
                    break;
                }

                if is_paused_clone.load(Ordering::Relaxed) {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                        _ = stop_rx.changed() => { break; }
                    }
                    continue;
                }

                let frame = config.frames[frame_idx % config.frames.len()];
                let line = status_line(frame, &label, &detail_rx.borrow(), config.show_detail);

                let _ = stdout.execute(MoveToColumn(0));
                let _ = stdout.execute(Clear(ClearType::CurrentLine));
                let _ = stdout.execute(SetForegroundColor(config.color));
                let _ = stdout.execute(Print(line));
                let _ = stdout.execute(ResetColor);
                let _ = stdout.flush();

                frame_idx += 1;

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(config.interval_ms)) => {}
                    _ = stop_rx.changed() => { break; }
                }
            }

            let _ = stdout.execute(Show);
        });

        SpinnerHandle {
            stop_tx,
            detail_tx,
            task: Some(task),
            is_paused,
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

fn status_line(frame: &str, label: &str, detail: &str, show_detail: bool) -> String {
    if show_detail && !detail.is_empty() {
        format!("{} {} · {}", frame, label, detail)
    } else {
        format!("{} {}", frame, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        assert_eq!(status_line("⠋", "Uploading", "", true), "⠋ Uploading");
        assert_eq!(
            status_line("⠋", "Uploading", "Processed 1 of 2 files", true),
            "⠋ Uploading · Processed 1 of 2 files"
        );
        assert_eq!(
            status_line("-", "Uploading", "Processed 1 of 2 files", false),
            "- Uploading"
        );
    }

    #[test]
    fn test_spinner_config_default() {
        let config = SpinnerConfig::default();
        assert_eq!(config.interval_ms, 80);
        assert!(config.show_detail);
        assert_eq!(config.color, Color::Cyan);
        assert_eq!(config.frames, SPINNER_FRAMES.to_vec());
    }

    #[tokio::test]
    async fn test_spinner_detail_updates() {
        let spinner = Spinner::with_config(SpinnerConfig {
            frames: vec!["-", "|"],
            interval_ms: 20,
            color: Color::Yellow,
            show_detail: true,
        });
        let handle = spinner.start("Uploading PDFs...");
        assert_eq!(*handle.detail_tx.borrow(), "");

        handle.set_detail("Processing: a.pdf");
        assert_eq!(*handle.detail_tx.borrow(), "Processing: a.pdf");

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_spinner_pause_resume() {
        let handle = Spinner::new().start("Pause test");
        assert!(!handle.is_paused());

        handle.pause();
        handle.pause();
        assert!(handle.is_paused());

        handle.resume();
        assert!(!handle.is_paused());

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_spinner_stops_while_paused() {
        let handle = Spinner::new().start("Paused stop");
        handle.pause();
        tokio::time::sleep(Duration::from_millis(60)).await;
        // Must not hang waiting on the paused loop
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_spinner_handle_drop() {
        let handle = Spinner::new().start("Drop test");
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(handle);
    }
}

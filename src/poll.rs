//! Upload status polling.
//!
//! While an upload request is in flight the controller runs a
//! [`StatusPoller`] that asks the backend for progress once per period and
//! pushes it into the view. The poller stops on its own when the backend
//! reports a terminal status; otherwise it runs until its [`PollHandle`] is
//! cancelled or dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::api::{Backend, UploadStatus};
use crate::chat::ChatView;

/// Why a poller stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Stopped from outside.
    Cancelled,
    /// The backend reported `completed` or `error`.
    Terminal(UploadStatus),
    /// The polling task panicked.
    Panicked,
}

/// What a finished poller did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    /// Status requests issued.
    pub polls: u32,
    pub outcome: PollOutcome,
}

/// Periodic status poller.
pub struct StatusPoller<B, V> {
    backend: Arc<B>,
    view: Arc<V>,
    period: Duration,
}

impl<B, V> StatusPoller<B, V>
where
    B: Backend + 'static,
    V: ChatView,
{
    pub fn new(backend: Arc<B>, view: Arc<V>, period: Duration) -> Self {
        Self {
            backend,
            view,
            period,
        }
    }

    /// Spawn the polling task. The first request goes out one period from now.
    pub fn start(self) -> PollHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        PollHandle {
            stop_tx,
            task: Some(task),
        }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) -> PollSummary {
        let period = self.period.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: u32 = 0;

        let cancelled = |polls| PollSummary {
            polls,
            outcome: PollOutcome::Cancelled,
        };

        loop {
            if *stop_rx.borrow() {
                return cancelled(polls);
            }

            tokio::select! {
                biased;
                _ = stop_rx.changed() => return cancelled(polls),
                _ = ticker.tick() => {}
            }

            polls += 1;
            trace!(poll = polls, "Polling upload status");

            // A stop while the request is pending abandons it
            let result = tokio::select! {
                biased;
                _ = stop_rx.changed() => return cancelled(polls),
                result = self.backend.upload_status() => result,
            };

            match result {
                Ok(progress) => {
                    self.view.update_progress(&progress);
                    if progress.status.is_terminal() {
                        debug!(status = %progress.status, polls, "Upload processing finished");
                        return PollSummary {
                            polls,
                            outcome: PollOutcome::Terminal(progress.status),
                        };
                    }
                }
                Err(e) => debug!(error = %e, "Status poll failed"),
            }
        }
    }
}

/// Owner of a running poller. Dropping it stops the task.
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<PollSummary>>,
}

impl PollHandle {
    /// Stop the poller and wait for its task to exit.
    pub async fn cancel(mut self) -> PollSummary {
        let _ = self.stop_tx.send(true);
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollSummary {
                polls: 0,
                outcome: PollOutcome::Panicked,
            }),
            None => PollSummary {
                polls: 0,
                outcome: PollOutcome::Cancelled,
            },
        }
    }

    /// Whether the task has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Answer, ApiError, UploadProgress, UploadReceipt};
    use crate::chat::MemoryView;
    use crate::files::PdfFile;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted status replies, then keeps reporting `processing`.
    #[derive(Default)]
    struct StatusScript {
        replies: Mutex<VecDeque<Result<UploadProgress, ApiError>>>,
        calls: AtomicU32,
    }

    impl StatusScript {
        fn new(replies: Vec<Result<UploadProgress, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn progress(status: UploadStatus, processed: u64) -> UploadProgress {
        UploadProgress {
            status,
            current_file: "a.pdf".into(),
            processed_files: processed,
            total_files: 2,
        }
    }

    #[async_trait]
    impl Backend for StatusScript {
        async fn upload_pdfs(&self, _files: Vec<PdfFile>) -> Result<UploadReceipt, ApiError> {
            unreachable!("poller never uploads")
        }

        async fn upload_status(&self) -> Result<UploadProgress, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(progress(UploadStatus::Processing, 0)))
        }

        async fn ask_question(&self, _question: &str) -> Result<Answer, ApiError> {
            unreachable!("poller never asks")
        }
    }

    fn start(
        script: StatusScript,
        period_ms: u64,
    ) -> (Arc<StatusScript>, Arc<MemoryView>, PollHandle) {
        let backend = Arc::new(script);
        let view = Arc::new(MemoryView::new());
        let handle = StatusPoller::new(
            Arc::clone(&backend),
            Arc::clone(&view),
            Duration::from_millis(period_ms),
        )
        .start();
        (backend, view, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_completed() {
        let (backend, view, handle) = start(
            StatusScript::new(vec![
                Ok(progress(UploadStatus::Processing, 0)),
                Ok(progress(UploadStatus::Processing, 1)),
                Ok(progress(UploadStatus::Completed, 2)),
            ]),
            1000,
        );

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(handle.is_finished());
        assert_eq!(backend.calls(), 3);

        let summary = handle.cancel().await;
        assert_eq!(summary.polls, 3);
        assert_eq!(summary.outcome, PollOutcome::Terminal(UploadStatus::Completed));

        let counters: Vec<u64> = view
            .progress_updates()
            .iter()
            .map(|p| p.processed_files)
            .collect();
        assert_eq!(counters, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_error_status() {
        let (_backend, _view, handle) =
            start(StatusScript::new(vec![Ok(progress(UploadStatus::Error, 0))]), 500);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let summary = handle.cancel().await;
        assert_eq!(summary.outcome, PollOutcome::Terminal(UploadStatus::Error));
        assert_eq!(summary.polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_waits_one_period() {
        let (backend, _view, handle) = start(StatusScript::default(), 1000);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(backend.calls(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(backend.calls(), 1);

        handle.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_polling() {
        let (backend, view, handle) = start(
            StatusScript::new(vec![
                Err(ApiError::Server("busy".into())),
                Ok(progress(UploadStatus::Completed, 2)),
            ]),
            1000,
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.calls(), 2);
        assert_eq!(view.progress_updates().len(), 1);
        assert_eq!(
            handle.cancel().await.outcome,
            PollOutcome::Terminal(UploadStatus::Completed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let (backend, _view, handle) = start(StatusScript::default(), 1000);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let summary = handle.cancel().await;
        assert_eq!(summary.outcome, PollOutcome::Cancelled);
        assert_eq!(summary.polls, 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let (backend, _view, handle) = start(StatusScript::default(), 1000);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_tick() {
        let (backend, view, handle) = start(StatusScript::default(), 1000);

        let summary = handle.cancel().await;
        assert_eq!(summary, PollSummary { polls: 0, outcome: PollOutcome::Cancelled });
        assert_eq!(backend.calls(), 0);
        assert!(view.progress_updates().is_empty());
    }
}

//! The chat controller: upload flow, question flow, rendering and layout.
//!
//! Every user event is handled by one `async` method. Callers spawn each
//! call on its own task so network requests never block input handling.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{Backend, HistoryEntry};
use crate::chat::{ChatView, MessageId, Role};
use crate::config::ClientSettings;
use crate::files::PdfFile;
use crate::layout::{history_max_height, HistoryHeight};
use crate::poll::StatusPoller;
use crate::session::UploadSession;

/// Shown when a question is asked before any upload succeeded.
pub const NOT_UPLOADED_MESSAGE: &str = "Please upload PDF before asking a question.";

/// Transient assistant bubble while waiting for an answer.
pub const THINKING_PLACEHOLDER: &str = "Thinking...";

/// Controller tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Poll upload status while an upload is in flight.
    pub poll_status: bool,
    pub poll_interval: Duration,
    /// Delay before scrolling to a new message.
    pub scroll_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_status: true,
            poll_interval: Duration::from_millis(1000),
            scroll_delay: Duration::from_millis(100),
        }
    }
}

impl From<&ClientSettings> for ControllerOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            poll_status: settings.poll_status,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            scroll_delay: Duration::from_millis(settings.scroll_delay_ms),
        }
    }
}

/// How an event handler ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Nothing to do (no files, empty question).
    Skipped,
    Succeeded,
    /// An error message was shown.
    Failed,
}

/// Hides the loading indicator when dropped.
struct LoadingGuard<'a, V: ChatView> {
    view: &'a V,
}

impl<'a, V: ChatView> LoadingGuard<'a, V> {
    fn show(view: &'a V) -> Self {
        view.show_loading();
        Self { view }
    }
}

impl<V: ChatView> Drop for LoadingGuard<'_, V> {
    fn drop(&mut self) {
        self.view.hide_loading();
    }
}

/// Removes the placeholder bubble when dropped.
struct PlaceholderGuard<'a, V: ChatView> {
    view: &'a V,
    id: MessageId,
}

impl<V: ChatView> Drop for PlaceholderGuard<'_, V> {
    fn drop(&mut self) {
        self.view.remove_message(self.id);
    }
}

/// Wires the view's events to the backend.
pub struct ChatUploadController<B, V> {
    backend: Arc<B>,
    view: Arc<V>,
    session: UploadSession,
    options: ControllerOptions,
    server_history: Mutex<Vec<HistoryEntry>>,
}

impl<B, V> ChatUploadController<B, V>
where
    B: Backend + 'static,
    V: ChatView,
{
    pub fn new(backend: Arc<B>, view: Arc<V>, options: ControllerOptions) -> Self {
        Self {
            backend,
            view,
            session: UploadSession::new(),
            options,
            server_history: Mutex::new(Vec::new()),
        }
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Whether an upload has succeeded at least once.
    pub fn is_uploaded(&self) -> bool {
        self.session.is_uploaded()
    }

    /// Latest question/answer history reported by the backend.
    pub fn server_history(&self) -> Vec<HistoryEntry> {
        self.server_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Upload the selected files.
    pub async fn on_files_selected(&self, files: Vec<PdfFile>) -> FlowOutcome {
        if files.is_empty() {
            debug!("No files selected, nothing to upload");
            return FlowOutcome::Skipped;
        }

        let bytes: usize = files.iter().map(PdfFile::len).sum();
        debug!(files = files.len(), bytes, "Uploading PDFs");

        let loading = LoadingGuard::show(&*self.view);
        let poller = self.options.poll_status.then(|| {
            StatusPoller::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.view),
                self.options.poll_interval,
            )
            .start()
        });

        let result = self.backend.upload_pdfs(files).await;

        if let Some(poller) = poller {
            let summary = poller.cancel().await;
            debug!(polls = summary.polls, outcome = ?summary.outcome, "Status polling ended");
        }
        drop(loading);

        match result {
            Ok(receipt) => {
                self.session.mark_uploaded();
                self.add_message(&receipt.confirmation(), Role::System);
                FlowOutcome::Succeeded
            }
            Err(e) => {
                warn!(error = %e, server_reported = e.is_server_reported(), "Upload failed");
                self.add_message(&format!("Error: {}", e), Role::Error);
                FlowOutcome::Failed
            }
        }
    }

    /// Ask a question about the uploaded documents.
    pub async fn on_ask(&self, raw_question: &str) -> FlowOutcome {
        if !self.session.is_uploaded() {
            self.add_message(NOT_UPLOADED_MESSAGE, Role::Error);
            return FlowOutcome::Failed;
        }

        let question = raw_question.trim();
        if question.is_empty() {
            return FlowOutcome::Skipped;
        }

        self.add_message(question, Role::User);
        self.view.clear_question_input();

        let placeholder = PlaceholderGuard {
            view: &*self.view,
            id: self.view.append_placeholder(THINKING_PLACEHOLDER),
        };
        self.schedule_scroll();

        debug!(chars = question.len(), "Asking question");
        let result = self.backend.ask_question(question).await;
        drop(placeholder);

        match result {
            Ok(answer) => {
                if let Some(history) = &answer.history {
                    *self
                        .server_history
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = history.clone();
                }
                self.add_message(&answer.display_text(), Role::Assistant);
                FlowOutcome::Succeeded
            }
            Err(e) => {
                warn!(error = %e, server_reported = e.is_server_reported(), "Question failed");
                self.add_message(&format!("Error: {}", e), Role::Error);
                FlowOutcome::Failed
            }
        }
    }

    /// Append a message and scroll to it once layout has settled.
    pub fn add_message(&self, text: &str, role: Role) -> MessageId {
        let id = self.view.append_message(role, text);
        self.schedule_scroll();
        id
    }

    fn schedule_scroll(&self) {
        let view = Arc::clone(&self.view);
        let delay = self.options.scroll_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            view.scroll_to_bottom();
        });
    }

    /// Give the history whatever height the controls leave free.
    pub fn adjust_layout(&self) -> HistoryHeight {
        let height = history_max_height(self.view.container_height(), self.view.controls_height());
        if !height.controls_fit() {
            debug!(%height, "Controls taller than the container, history collapsed");
        }
        self.view.set_history_max_height(height);
        height
    }
}

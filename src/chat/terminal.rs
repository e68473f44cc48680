//! [`ChatView`] backed by the terminal.
//!
//! Keeps the transcript and publishes each change on the message bus for
//! the renderer task. Sends happen under the state lock so bus order always
//! matches transcript order.

use std::io::{stdout, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{ChatMessage, ChatView, MessageId, Role, Transcript};
use crate::api::UploadProgress;
use crate::layout::{terminal_dimensions, HistoryHeight};
use crate::messaging::{Message, MessageSender};

/// Rows taken by the reedline prompt.
pub const PROMPT_ROWS: u16 = 1;
/// Rows taken by the loading indicator while it is visible.
pub const LOADING_ROWS: u16 = 1;
pub const LOADING_LABEL: &str = "Uploading PDFs...";

#[derive(Debug, Default)]
struct TerminalState {
    transcript: Transcript,
    loading_visible: bool,
    max_height: Option<HistoryHeight>,
}

/// Terminal chat view.
pub struct TerminalView {
    sender: MessageSender,
    state: Mutex<TerminalState>,
}

impl TerminalView {
    pub fn new(sender: MessageSender) -> Self {
        Self {
            sender,
            state: Mutex::new(TerminalState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().transcript.messages().to_vec()
    }

    pub fn history_max_height(&self) -> Option<HistoryHeight> {
        self.state().max_height
    }

    /// Newest messages that fit the history panel.
    pub fn transcript_tail(&self) -> Vec<ChatMessage> {
        let (width, height) = terminal_dimensions();
        let state = self.state();
        let rows = state.max_height.map(|h| h.max).unwrap_or(height);
        state.transcript.tail_within(rows, width)
    }

    /// Show a notice that is not part of the chat history.
    pub fn warning(&self, text: &str) {
        self.sender.warning(text);
    }

    /// Print the visible part of the history again.
    pub fn redraw(&self) {
        let tail = self.transcript_tail();
        let _ = self.sender.send(Message::Divider);
        for message in tail {
            self.sender.chat(message);
        }
    }
}

impl ChatView for TerminalView {
    fn append_message(&self, role: Role, text: &str) -> MessageId {
        let mut state = self.state();
        let message = state.transcript.push(role, text);
        let id = message.id;
        self.sender.chat(message);
        id
    }

    fn append_placeholder(&self, text: &str) -> MessageId {
        let mut state = self.state();
        let message = state.transcript.push_placeholder(text);
        let id = message.id;
        self.sender.chat(message);
        id
    }

    fn remove_message(&self, id: MessageId) {
        let mut state = self.state();
        if state.transcript.remove(id).is_some() {
            self.sender.retract(id);
        }
    }

    fn scroll_to_bottom(&self) {
        let _ = stdout().flush();
    }

    // reedline clears its own buffer on submit
    fn clear_question_input(&self) {}

    fn show_loading(&self) {
        let mut state = self.state();
        state.loading_visible = true;
        self.sender.loading(true, LOADING_LABEL);
    }

    fn hide_loading(&self) {
        let mut state = self.state();
        if state.loading_visible {
            state.loading_visible = false;
            self.sender.loading(false, LOADING_LABEL);
        }
    }

    fn update_progress(&self, progress: &UploadProgress) {
        let state = self.state();
        if state.loading_visible {
            self.sender.progress(progress.clone());
        }
    }

    fn controls_height(&self) -> u16 {
        if self.state().loading_visible {
            PROMPT_ROWS + LOADING_ROWS
        } else {
            PROMPT_ROWS
        }
    }

    fn container_height(&self) -> u16 {
        terminal_dimensions().1
    }

    fn set_history_max_height(&self, height: HistoryHeight) {
        debug!(%height, "History height adjusted");
        self.state().max_height = Some(height);
    }
}

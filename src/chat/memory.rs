//! In-memory [`ChatView`] that records everything it is asked to do.
//!
//! Used to drive the controller without a terminal, e.g. in tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ChatMessage, ChatView, MessageId, Role, Transcript};
use crate::api::UploadProgress;
use crate::layout::HistoryHeight;

const DEFAULT_CONTAINER_ROWS: u16 = 24;
const DEFAULT_CONTROLS_ROWS: u16 = 1;

#[derive(Debug, Default)]
struct MemoryState {
    transcript: Transcript,
    loading_visible: bool,
    loading_shows: usize,
    progress: Vec<UploadProgress>,
    scrolls: usize,
    input_clears: usize,
    container: u16,
    controls: u16,
    max_height: Option<HistoryHeight>,
}

/// Recording view.
#[derive(Debug)]
pub struct MemoryView {
    state: Mutex<MemoryState>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_CONTAINER_ROWS, DEFAULT_CONTROLS_ROWS)
    }

    pub fn with_dimensions(container: u16, controls: u16) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                container,
                controls,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate a resize.
    pub fn set_dimensions(&self, container: u16, controls: u16) {
        let mut state = self.state();
        state.container = container;
        state.controls = controls;
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().transcript.messages().to_vec()
    }

    /// Texts of all messages with `role`, oldest first.
    pub fn texts_with_role(&self, role: Role) -> Vec<String> {
        self.state()
            .transcript
            .messages()
            .iter()
            .filter(|m| m.role == role)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn is_loading_visible(&self) -> bool {
        self.state().loading_visible
    }

    /// How many times the loading indicator was shown.
    pub fn loading_shows(&self) -> usize {
        self.state().loading_shows
    }

    pub fn progress_updates(&self) -> Vec<UploadProgress> {
        self.state().progress.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.state().scrolls
    }

    pub fn input_clears(&self) -> usize {
        self.state().input_clears
    }

    pub fn history_max_height(&self) -> Option<HistoryHeight> {
        self.state().max_height
    }
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for MemoryView {
    fn append_message(&self, role: Role, text: &str) -> MessageId {
        self.state().transcript.push(role, text).id
    }

    fn append_placeholder(&self, text: &str) -> MessageId {
        self.state().transcript.push_placeholder(text).id
    }

    fn remove_message(&self, id: MessageId) {
        self.state().transcript.remove(id);
    }

    fn scroll_to_bottom(&self) {
        self.state().scrolls += 1;
    }

    fn clear_question_input(&self) {
        self.state().input_clears += 1;
    }

    fn show_loading(&self) {
        let mut state = self.state();
        state.loading_visible = true;
        state.loading_shows += 1;
    }

    fn hide_loading(&self) {
        self.state().loading_visible = false;
    }

    fn update_progress(&self, progress: &UploadProgress) {
        self.state().progress.push(progress.clone());
    }

    fn controls_height(&self) -> u16 {
        self.state().controls
    }

    fn container_height(&self) -> u16 {
        self.state().container
    }

    fn set_history_max_height(&self, height: HistoryHeight) {
        self.state().max_height = Some(height);
    }
}

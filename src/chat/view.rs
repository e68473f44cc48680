//! The surface the controller drives.

use super::{MessageId, Role};
use crate::api::UploadProgress;
use crate::layout::HistoryHeight;

/// Everything the chat controller needs from a user interface.
///
/// Calls are synchronous and cheap; implementations keep their own
/// interior mutability so a view can be shared between event tasks.
pub trait ChatView: Send + Sync + 'static {
    /// Append a bubble to the history.
    fn append_message(&self, role: Role, text: &str) -> MessageId;

    /// Append a transient bubble that will be removed once superseded.
    fn append_placeholder(&self, text: &str) -> MessageId {
        self.append_message(Role::Assistant, text)
    }

    /// Remove a bubble. Unknown ids are ignored.
    fn remove_message(&self, id: MessageId);

    /// Bring the newest bubble into view.
    fn scroll_to_bottom(&self);

    /// Empty the question input after it was submitted.
    fn clear_question_input(&self);

    fn show_loading(&self);

    fn hide_loading(&self);

    /// Replace the loading indicator's progress text.
    fn update_progress(&self, progress: &UploadProgress);

    /// Current height of the controls panel.
    fn controls_height(&self) -> u16;

    /// Current height of the whole chat container.
    fn container_height(&self) -> u16;

    fn set_history_max_height(&self, height: HistoryHeight);
}

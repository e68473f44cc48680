//! Append-only message list.

use super::{ChatMessage, MessageId, Role};
use crate::layout::text_rows;

/// Ordered chat history. Messages are only ever appended; removal exists
/// for placeholders and never reorders what remains.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    next_id: u64,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    /// Append a message and return a copy of it.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage::new(self.allocate_id(), role, text);
        self.messages.push(message.clone());
        message
    }

    /// Append a transient placeholder and return a copy of it.
    pub fn push_placeholder(&mut self, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage::placeholder(self.allocate_id(), text);
        self.messages.push(message.clone());
        message
    }

    /// Remove a message. Returns `None` if it was already gone.
    pub fn remove(&mut self, id: MessageId) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(index))
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Newest messages that fit in `max_rows` rows of a `width`-column
    /// terminal, oldest first. Each message is followed by a blank row.
    pub fn tail_within(&self, max_rows: u16, width: u16) -> Vec<ChatMessage> {
        let mut used: u32 = 0;
        let mut tail: Vec<ChatMessage> = Vec::new();

        for message in self.messages.iter().rev() {
            let rows = u32::from(text_rows(&message.text, width)) + 1;
            if used + rows > u32::from(max_rows) {
                break;
            }
            used += rows;
            tail.push(message.clone());
        }

        tail.reverse();
        tail
    }
}

//! Message types for view-to-renderer communication.

use serde::{Deserialize, Serialize};

use crate::api::UploadProgress;
use crate::chat::{ChatMessage, MessageId};

/// Message levels for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A plain notice outside the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextMessage {
    pub level: MessageLevel,
    pub text: String,
}

/// Removal of a previously rendered chat bubble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetractMessage {
    pub id: MessageId,
}

/// Loading indicator visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingMessage {
    pub visible: bool,
    pub label: String,
}

/// Any message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Chat(ChatMessage),
    Retract(RetractMessage),
    Loading(LoadingMessage),
    Progress(UploadProgress),
    Text(TextMessage),
    Divider,
    Clear,
}

impl Message {
    /// Create an info message.
    pub fn info(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Info,
            text: text.into(),
        })
    }

    /// Create a success message.
    pub fn success(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Success,
            text: text.into(),
        })
    }

    /// Create a warning message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Warning,
            text: text.into(),
        })
    }

    /// Create an error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Error,
            text: text.into(),
        })
    }

    pub fn retract(id: MessageId) -> Self {
        Self::Retract(RetractMessage { id })
    }

    /// Show the loading indicator with `label` until progress arrives.
    pub fn loading_started(label: impl Into<String>) -> Self {
        Self::Loading(LoadingMessage {
            visible: true,
            label: label.into(),
        })
    }

    pub fn loading_finished() -> Self {
        Self::Loading(LoadingMessage {
            visible: false,
            label: String::new(),
        })
    }
}

//! Chat message types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who a chat bubble belongs to. Decides its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Error => "error",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to an appended message, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    /// Transient entry shown while waiting for the server.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl ChatMessage {
    pub fn new(id: MessageId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            placeholder: false,
        }
    }

    pub fn placeholder(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: text.into(),
            placeholder: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        assert_eq!(Role::Error.to_string(), "error");
    }

    #[test]
    fn test_placeholder_is_assistant() {
        let msg = ChatMessage::placeholder(MessageId(3), "Thinking...");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.placeholder);
    }

    #[test]
    fn test_placeholder_flag_skipped_when_false() {
        let msg = ChatMessage::new(MessageId(1), Role::User, "hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("placeholder"));

        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_message_id_ordering() {
        assert!(MessageId(1) < MessageId(2));
        assert_eq!(MessageId(7).to_string(), "#7");
    }
}

//! Broadcast bus between views and renderers.

use super::Message;
use crate::api::UploadProgress;
use crate::chat::{ChatMessage, MessageId};
use tokio::sync::broadcast;

/// Buffered messages per subscriber before it starts lagging.
const BUS_CAPACITY: usize = 256;

/// Sender half of the message bus.
#[derive(Clone)]
pub struct MessageSender {
    tx: broadcast::Sender<Message>,
}

impl MessageSender {
    /// Send a message.
    pub fn send(&self, message: Message) -> Result<(), BusError> {
        self.tx.send(message).map_err(|_| BusError::Closed)?;
        Ok(())
    }

    /// Publish a chat bubble.
    pub fn chat(&self, message: ChatMessage) {
        let _ = self.send(Message::Chat(message));
    }

    /// Publish the removal of a chat bubble.
    pub fn retract(&self, id: MessageId) {
        let _ = self.send(Message::retract(id));
    }

    /// Publish loading indicator visibility.
    pub fn loading(&self, visible: bool, label: &str) {
        let message = if visible {
            Message::loading_started(label)
        } else {
            Message::loading_finished()
        };
        let _ = self.send(message);
    }

    /// Publish upload progress.
    pub fn progress(&self, progress: UploadProgress) {
        let _ = self.send(Message::Progress(progress));
    }

    /// Send an info notice.
    pub fn info(&self, text: impl Into<String>) {
        let _ = self.send(Message::info(text));
    }

    /// Send a warning notice.
    pub fn warning(&self, text: impl Into<String>) {
        let _ = self.send(Message::warning(text));
    }
}

/// Receiver half of the message bus.
pub struct MessageReceiver {
    rx: broadcast::Receiver<Message>,
}

impl MessageReceiver {
    /// Receive the next message.
    pub async fn recv(&mut self) -> Result<Message, BusError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::Closed,
            broadcast::error::RecvError::Lagged(n) => BusError::Lagged(n),
        })
    }

    /// Try to receive a message without waiting.
    pub fn try_recv(&mut self) -> Result<Option<Message>, BusError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(BusError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(BusError::Lagged(n)),
        }
    }
}

/// Message bus for view-renderer communication.
///
/// The bus itself holds no sender, so subscribers see [`BusError::Closed`]
/// once every [`MessageSender`] is dropped.
pub struct MessageBus {
    tx: broadcast::Sender<Message>,
}

impl MessageBus {
    /// Create a new message bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Get a sender.
    pub fn sender(&self) -> MessageSender {
        MessageSender {
            tx: self.tx.clone(),
        }
    }

    /// Subscribe to messages.
    pub fn subscribe(&self) -> MessageReceiver {
        MessageReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Split into a sender and a subscriber, dropping the bus's own handle.
    pub fn split(self) -> (MessageSender, MessageReceiver) {
        let receiver = self.subscribe();
        (MessageSender { tx: self.tx }, receiver)
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Channel closed")]
    Closed,
    #[error("Lagged behind by {0} messages")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadStatus;
    use crate::chat::Role;

    #[test]
    fn test_chat_reaches_every_subscriber() {
        let bus = MessageBus::new();
        let sender = bus.sender();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        sender.chat(ChatMessage::new(MessageId(1), Role::User, "hello"));

        for receiver in [&mut first, &mut second] {
            match receiver.try_recv().unwrap() {
                Some(Message::Chat(msg)) => assert_eq!(msg.text, "hello"),
                other => panic!("Expected Chat message, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_send_without_subscribers_is_closed() {
        let bus = MessageBus::new();
        let sender = bus.sender();

        let result = sender.send(Message::info("nobody listens"));
        assert!(matches!(result, Err(BusError::Closed)));

        // Helpers swallow the error
        sender.retract(MessageId(1));
        sender.loading(true, "Uploading");
        sender.info("ignored");
    }

    #[test]
    fn test_loading_helper_maps_visibility() {
        let bus = MessageBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();

        sender.loading(true, "Uploading 2 PDFs...");
        sender.loading(false, "ignored label");

        match receiver.try_recv().unwrap() {
            Some(Message::Loading(l)) => {
                assert!(l.visible);
                assert_eq!(l.label, "Uploading 2 PDFs...");
            }
            other => panic!("Expected Loading, got {:?}", other),
        }
        match receiver.try_recv().unwrap() {
            Some(Message::Loading(l)) => assert!(!l.visible && l.label.is_empty()),
            other => panic!("Expected Loading, got {:?}", other),
        }
    }

    #[test]
    fn test_try_recv_empty() {
        let bus = MessageBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_split_closes_when_sender_dropped() {
        let (sender, mut receiver) = MessageBus::new().split();
        sender.progress(UploadProgress {
            status: UploadStatus::Completed,
            current_file: String::new(),
            processed_files: 2,
            total_files: 2,
        });
        drop(sender);

        assert!(matches!(receiver.recv().await, Ok(Message::Progress(_))));
        assert!(matches!(receiver.recv().await, Err(BusError::Closed)));
    }

    #[tokio::test]
    async fn test_ordering_across_tasks() {
        let (sender, mut receiver) = MessageBus::new().split();

        let handle = tokio::spawn(async move {
            sender.info("first");
            sender.warning("second");
        });
        handle.await.unwrap();

        let texts: Vec<String> = [receiver.recv().await, receiver.recv().await]
            .into_iter()
            .map(|m| match m {
                Ok(Message::Text(t)) => t.text,
                other => panic!("Expected Text, got {:?}", other),
            })
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_receiver_reports_lag() {
        let (tx, _) = broadcast::channel::<Message>(2);
        let mut receiver = MessageReceiver { rx: tx.subscribe() };

        for i in 0..5 {
            let _ = tx.send(Message::info(format!("msg {}", i)));
        }

        assert!(matches!(receiver.recv().await, Err(BusError::Lagged(n)) if n > 0));
    }

    #[test]
    fn test_bus_error_display() {
        assert_eq!(BusError::Closed.to_string(), "Channel closed");
        assert_eq!(BusError::Lagged(42).to_string(), "Lagged behind by 42 messages");
    }
}

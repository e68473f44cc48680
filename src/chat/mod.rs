//! Chat history model and the views that display it.

mod memory;
mod message;
mod terminal;
mod transcript;
mod view;

pub use memory::MemoryView;
pub use message::{ChatMessage, MessageId, Role};
pub use terminal::{TerminalView, LOADING_LABEL, LOADING_ROWS, PROMPT_ROWS};
pub use transcript::Transcript;
pub use view::ChatView;

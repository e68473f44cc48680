//! Messaging between the chat view and the terminal.
//!
//! [`TerminalView`](crate::chat::TerminalView) publishes every change it
//! makes to its transcript as a [`Message`] on the [`MessageBus`]; a
//! [`TerminalRenderer`] task subscribes and draws them.
//!
//! ```text
//!   ChatUploadController ──▶ TerminalView ──▶ MessageBus ──▶ TerminalRenderer
//!                              (transcript)    broadcast      stdout | reedline printer
//! ```

mod bus;
mod renderer;
mod spinner;
mod types;

pub use bus::{BusError, MessageBus, MessageReceiver, MessageSender};
pub use renderer::{
    progress_detail, rendered_rows, MessageFormatter, RenderStyle, RenderTarget, TerminalRenderer,
};
pub use spinner::{Spinner, SpinnerConfig, SpinnerHandle};
pub use types::*;

//! pdfchat library
//!
//! A terminal chat client for a PDF question-answering service: upload PDFs,
//! watch them being processed, then ask questions about them.
//!
//! ## Main Components
//!
//! - [`api`] - Backend endpoints ([`Backend`] trait, [`HttpBackend`])
//! - [`controller`] - Upload and question flows ([`ChatUploadController`])
//! - [`poll`] - Upload status polling while an upload is in flight
//! - [`chat`] - Messages, transcript and the [`ChatView`] seam
//! - [`messaging`] - Message bus and terminal renderer
//! - [`cli`] - REPL, completion and runners
//! - [`config`] - Settings and XDG paths
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use pdfchat::{ChatUploadController, ControllerOptions, HttpBackend, MemoryView};
//!
//! let backend = Arc::new(HttpBackend::new("http://127.0.0.1:8000")?);
//! let view = Arc::new(MemoryView::new());
//! let controller = ChatUploadController::new(backend, view, ControllerOptions::default());
//! controller.on_files_selected(files).await;
//! controller.on_ask("What is this document about?").await;
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod config;
pub mod controller;
pub mod files;
pub mod layout;
pub mod messaging;
pub mod poll;
pub mod session;

pub use api::{Answer, ApiError, Backend, HttpBackend, UploadProgress, UploadReceipt, UploadStatus};
pub use chat::{ChatMessage, ChatView, MemoryView, MessageId, Role, TerminalView};
pub use config::{ClientSettings, SettingsError, XdgDirs};
pub use controller::{ChatUploadController, ControllerOptions, FlowOutcome};
pub use files::{
    expand_selection, read_selection, select_files, split_args, FileSelectionError, PdfFile,
};
pub use layout::{history_max_height, HistoryHeight};
pub use messaging::{Message, MessageBus, MessageSender, TerminalRenderer};
pub use poll::{PollHandle, PollOutcome, PollSummary, StatusPoller};
pub use session::UploadSession;

//! Backend API client.
//!
//! The chat talks to three endpoints of the PDF question-answering service:
//!
//! - `POST /upload-pdf/` - multipart upload, repeated `files` field
//! - `POST /upload-status` - progress of the server-side processing
//! - `POST /ask-question/` - multipart field `question`
//!
//! [`Backend`] is the seam the controller depends on; [`HttpBackend`] is the
//! `reqwest` implementation. Tests substitute their own.

mod error;
mod http;
mod types;

use async_trait::async_trait;

use crate::files::PdfFile;

pub use error::ApiError;
pub use http::HttpBackend;
pub use types::{
    Answer, AskReply, Elapsed, HistoryEntry, UploadProgress, UploadReceipt, UploadReply,
    UploadStatus,
};

/// Endpoint paths, relative to the configured base URL.
pub const UPLOAD_PATH: &str = "upload-pdf/";
pub const STATUS_PATH: &str = "upload-status";
pub const ASK_PATH: &str = "ask-question/";

/// The question-answering service as seen by the chat.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upload all files in one request.
    async fn upload_pdfs(&self, files: Vec<PdfFile>) -> Result<UploadReceipt, ApiError>;

    /// Poll the processing state of the current upload.
    async fn upload_status(&self) -> Result<UploadProgress, ApiError>;

    /// Ask a question about the uploaded documents.
    async fn ask_question(&self, question: &str) -> Result<Answer, ApiError>;
}

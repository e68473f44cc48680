//! Wire types for the backend endpoints.
//!
//! Replies are deserialized leniently (every field optional) and then
//! classified into a typed success or an [`ApiError`], mirroring how the
//! backend signals failures in-band with an `error` field.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ApiError;

/// Server-reported duration. The backend sends either seconds or a
/// preformatted string; both are displayed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Elapsed {
    Seconds(f64),
    Text(String),
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elapsed::Seconds(secs) => write!(f, "{}", secs),
            Elapsed::Text(text) => f.write_str(text),
        }
    }
}

/// Processing state reported by `/upload-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UploadStatus {
    Processing,
    Completed,
    Error,
    /// Any state this client does not know about; polling continues.
    Other(String),
}

impl UploadStatus {
    /// Whether polling should stop after seeing this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
            UploadStatus::Other(other) => other,
        }
    }
}

impl From<String> for UploadStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "processing" => UploadStatus::Processing,
            "completed" => UploadStatus::Completed,
            "error" => UploadStatus::Error,
            _ => UploadStatus::Other(value),
        }
    }
}

impl From<UploadStatus> for String {
    fn from(status: UploadStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One poll of the upload status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub status: UploadStatus,
    #[serde(default)]
    pub current_file: String,
    #[serde(default)]
    pub processed_files: u64,
    #[serde(default)]
    pub total_files: u64,
}

impl UploadProgress {
    /// "Processing: <file>" line of the loading indicator.
    pub fn current_file_line(&self) -> String {
        format!("Processing: {}", self.current_file)
    }

    /// "Processed X of Y files" line of the loading indicator.
    pub fn counter_line(&self) -> String {
        format!(
            "Processed {} of {} files",
            self.processed_files, self.total_files
        )
    }
}

/// Raw reply of `/upload-pdf/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub processing_time: Option<Elapsed>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadReply {
    /// Classify the reply. A non-empty `error` field is a failure.
    pub fn into_receipt(self) -> Result<UploadReceipt, ApiError> {
        match self.error {
            Some(error) if !error.is_empty() => Err(ApiError::Server(error)),
            _ => Ok(UploadReceipt {
                message: self.message,
                processing_time: self.processing_time,
            }),
        }
    }
}

/// Successful upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReceipt {
    pub message: Option<String>,
    pub processing_time: Option<Elapsed>,
}

impl UploadReceipt {
    /// Confirmation text for the chat.
    pub fn confirmation(&self) -> String {
        if let Some(elapsed) = &self.processing_time {
            return format!("PDFs processed in {}. Ready for questions!", elapsed);
        }
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => "PDFs uploaded. Ready for questions!".to_string(),
        }
    }
}

/// One question/answer pair of the server-side history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

/// Raw reply of `/ask-question/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub response_time: Option<Elapsed>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
}

impl AskReply {
    /// Classify the reply. Only a non-empty `response` counts as an answer.
    pub fn into_answer(self) -> Result<Answer, ApiError> {
        match self.response {
            Some(text) if !text.is_empty() => Ok(Answer {
                text,
                response_time: self.response_time,
                history: self.history,
            }),
            _ => match self.error {
                Some(error) if !error.is_empty() => Err(ApiError::Server(error)),
                _ => Err(ApiError::EmptyAnswer),
            },
        }
    }
}

/// Successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub response_time: Option<Elapsed>,
    pub history: Option<Vec<HistoryEntry>>,
}

impl Answer {
    /// Chat text for the assistant bubble.
    pub fn display_text(&self) -> String {
        match &self.response_time {
            Some(elapsed) => format!("{}\n\nResponse time: {}", self.text, elapsed),
            None => self.text.clone(),
        }
    }
}

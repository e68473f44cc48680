//! Errors raised while talking to the backend.

use thiserror::Error;

/// Failure of a backend call.
///
/// `Display` yields the text shown to the user after the `Error: ` prefix, so
/// server-reported messages are surfaced verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an `error` (or `detail`) field.
    #[error("{0}")]
    Server(String),

    /// Non-success HTTP status without a recognizable error payload.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be sent or the response body could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("Invalid response from server: {0}")]
    Decode(#[from] serde_json::Error),

    /// The answer endpoint returned neither an answer nor an error.
    #[error("No answer returned")]
    EmptyAnswer,

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Whether the failure was reported by the application rather than the transport.
    pub fn is_server_reported(&self) -> bool {
        matches!(self, ApiError::Server(_) | ApiError::EmptyAnswer)
    }
}

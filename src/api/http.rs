//! `reqwest` implementation of [`Backend`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::{
    Answer, ApiError, AskReply, Backend, UploadProgress, UploadReceipt, UploadReply, ASK_PATH,
    STATUS_PATH, UPLOAD_PATH,
};
use crate::files::PdfFile;

/// Multipart field carrying each uploaded file.
const FILES_FIELD: &str = "files";
/// Form field carrying the question.
const QUESTION_FIELD: &str = "question";
const PDF_MIME: &str = "application/pdf";

/// HTTP client for the question-answering service.
///
/// No timeout is configured: a hanging server is waited on indefinitely.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend for `base_url` with a default client.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a backend reusing an existing client.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        trace!(status = status.as_u16(), body = %body, "Backend response");

        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Parse the base URL and make sure relative joins append to its path.
fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Build the error for a non-success status, preferring the server's own
/// `error` or `detail` text.
fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
        {
            return ApiError::Server(message.to_string());
        }
        if let Some(detail) = value.get("detail") {
            let text = match detail.as_str() {
                Some(s) => s.to_string(),
                None => detail.to_string(),
            };
            return ApiError::Server(text);
        }
    }

    ApiError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload_pdfs(&self, files: Vec<PdfFile>) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let count = files.len();

        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(PDF_MIME)?;
            form = form.part(FILES_FIELD, part);
        }

        debug!(%url, files = count, "Uploading PDFs");
        let response = self.client.post(url).multipart(form).send().await?;
        let reply: UploadReply = Self::read_json(response).await?;
        reply.into_receipt()
    }

    async fn upload_status(&self) -> Result<UploadProgress, ApiError> {
        let url = self.endpoint(STATUS_PATH)?;
        let response = self.client.post(url).send().await?;
        Self::read_json(response).await
    }

    async fn ask_question(&self, question: &str) -> Result<Answer, ApiError> {
        let url = self.endpoint(ASK_PATH)?;
        let form = Form::new().text(QUESTION_FIELD, question.to_string());

        debug!(%url, chars = question.len(), "Asking question");
        let response = self.client.post(url).multipart(form).send().await?;
        let reply: AskReply = Self::read_json(response).await?;
        reply.into_answer()
    }
}

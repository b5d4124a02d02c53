use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// File types the backend's ingestion pipeline accepts.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "docx", "md"];

/// The backend rejects larger request bodies, so catch oversized files locally.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

#[derive(Deserialize, Default)]
struct UploadError {
    error: Option<String>,
}

/// Success body from `/upload`. The backend echoes the stored file name,
/// but the client tolerates either field being absent.
#[derive(Deserialize, Default)]
pub struct UploadReceipt {
    pub message: Option<String>,
    pub filename: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the user's message to `/chat` and return the assistant's reply.
    ///
    /// A non-2xx status, an unparseable body, and a body without a `response`
    /// field are all the same failure to the caller; the distinction only
    /// matters in the log.
    pub async fn send_chat(&self, message: &str) -> Result<String> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status {}",
                response.status()
            ));
        }

        let body: ChatResponse = response.json().await?;
        body.response
            .ok_or_else(|| anyhow!("chat response body has no `response` field"))
    }

    /// Upload a document to `/upload` as a multipart form with a single
    /// `file` part. Type and size are validated locally first.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadReceipt> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid file name: {}", path.display()))?
            .to_string();

        if !is_allowed_file(&file_name) {
            return Err(anyhow!(
                "unsupported file type (allowed: {})",
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }

        let bytes = tokio::fs::read(path).await?;
        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(anyhow!(
                "{} is larger than the {} MB upload limit",
                file_name,
                MAX_UPLOAD_BYTES / (1024 * 1024)
            ));
        }

        let part = Part::bytes(bytes).file_name(file_name);
        let form = Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            // Prefer the server's own error text when the body has one
            let detail: UploadError = response.json().await.unwrap_or_default();
            return Err(match detail.error {
                Some(error) => anyhow!("{}", error),
                None => anyhow!("upload failed with status {}", status),
            });
        }

        // Success body shape is not guaranteed beyond 2xx
        Ok(response.json().await.unwrap_or_default())
    }
}

/// Whether the file name carries an extension the backend will ingest.
pub fn is_allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_to_expected_wire_shape() {
        let body = serde_json::to_value(ChatRequest {
            message: "what is gradient descent?",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "what is gradient descent?" })
        );
    }

    #[test]
    fn chat_response_field_is_extracted() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"response": "hello"}"#).unwrap();
        assert_eq!(parsed.response.as_deref(), Some("hello"));
    }

    #[test]
    fn chat_response_missing_field_is_none_not_a_panic() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"answer": "hello"}"#).unwrap();
        assert!(parsed.response.is_none());
    }

    #[test]
    fn upload_error_body_is_optional() {
        let with: UploadError = serde_json::from_str(r#"{"error": "No file part"}"#).unwrap();
        assert_eq!(with.error.as_deref(), Some("No file part"));

        let without: UploadError = serde_json::from_str("{}").unwrap();
        assert!(without.error.is_none());
    }

    #[test]
    fn allowed_extensions_are_case_insensitive() {
        assert!(is_allowed_file("notes.md"));
        assert!(is_allowed_file("paper.PDF"));
        assert!(is_allowed_file("report.Docx"));
        assert!(!is_allowed_file("photo.png"));
        assert!(!is_allowed_file("no_extension"));
        assert!(!is_allowed_file(".pdf"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client =
            BackendClient::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}

use crate::config::{Config, DEFAULT_API_BASE};
use crate::error::ForwardError;
use crate::staging::StagedFile;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

const DOCUMENT_MIME: &str = "application/octet-stream";

/// Per-phase timeouts and endpoint for document uploads.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub api_base: String,
    pub connect_timeout: Duration,
    /// Budget for sending the body. reqwest has no per-write timeout, so
    /// this only widens the overall deadline (connect + write + read).
    pub write_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        UploadOptions {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for UploadOptions {
    fn from(config: &Config) -> Self {
        UploadOptions {
            api_base: config.api_base.clone(),
            connect_timeout: config.connect_timeout(),
            write_timeout: config.write_timeout(),
            read_timeout: config.read_timeout(),
        }
    }
}

/// Bot API client for `sendDocument`. Holds no per-request state, so
/// one instance is shared by every pipeline run.
#[derive(Debug, Clone)]
pub struct TelegramBot {
    client: reqwest::Client,
    api_url: String,
}

impl TelegramBot {
    pub fn new(options: &UploadOptions) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .timeout(options.connect_timeout + options.write_timeout + options.read_timeout)
            .build()?;
        Ok(TelegramBot {
            client,
            api_url: options.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn send_document_url(&self, token: &str) -> String {
        format!("{}/bot{}/sendDocument", self.api_url, token)
    }

    /// Upload `staged` to `chat_id` in a single attempt.
    pub async fn send_document(
        &self,
        staged: &StagedFile,
        token: &str,
        chat_id: &str,
    ) -> Result<(), ForwardError> {
        let file_name = staged.file_name();
        debug!(
            "Sending document {} ({} bytes) to: {}/bot***/sendDocument",
            file_name, staged.size_bytes, self.api_url
        );

        let bytes = tokio::fs::read(&staged.local_path)
            .await
            .map_err(ForwardError::Staging)?;
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(DOCUMENT_MIME)?;
        let form = Form::new()
            .part("document", part)
            .text("chat_id", chat_id.to_string());

        let response = self
            .client
            .post(self.send_document_url(token))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Document sent successfully: {}", status);
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        error!("Upload failed: {} - {}", status, body);
        Err(ForwardError::RemoteRejection {
            status: status.as_u16(),
            body,
        })
    }
}

//! Email notification for runs that flagged products
//!
//! [`SendGridNotifier`] posts to the SendGrid v3 `mail/send` endpoint. The run
//! only calls a notifier after the report is on disk, and treats every
//! [`NotifyError`] as a warning.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::config::NotifyConfig;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail service rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("No report recipient configured")]
    MissingRecipient,

    #[error("Failed to read report attachment {path:?}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a finished run tells the recipient
#[derive(Debug, Clone)]
pub struct Notification {
    pub flagged_count: usize,
    /// Per-label breakdown, one "Label: n" line each
    pub summary: String,
    pub report_path: PathBuf,
}

impl Notification {
    pub fn body(&self) -> String {
        let mut body = format!(
            "There are {} products with missing fire labels. Please check the attached report.",
            self.flagged_count
        );
        if !self.summary.is_empty() {
            body.push_str("\n\n");
            body.push_str(&self.summary);
        }
        body
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct SendGridNotifier {
    client: Client,
    api_key: String,
    from: String,
    to: String,
    subject: String,
    endpoint: String,
    attach_report: bool,
}

impl SendGridNotifier {
    /// Build a notifier with an explicit API key. `config.to` must be set.
    pub fn new(api_key: impl Into<String>, config: &NotifyConfig) -> Result<Self, NotifyError> {
        let to = config.to.clone().ok_or(NotifyError::MissingRecipient)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            from: config.from.clone(),
            to,
            subject: config.subject.clone(),
            endpoint: config.endpoint.clone(),
            attach_report: config.attach_report,
        })
    }

    /// Notifier for the configured key, or `None` when no key is configured.
    pub fn from_config(config: &NotifyConfig) -> Option<Result<Self, NotifyError>> {
        config
            .api_key
            .as_deref()
            .map(|api_key| Self::new(api_key, config))
    }

    fn payload(&self, notification: &Notification, attachment: Option<(&str, &[u8])>) -> Value {
        let mut payload = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": self.subject,
            "content": [{ "type": "text/plain", "value": notification.body() }],
        });

        if let Some((filename, bytes)) = attachment {
            payload["attachments"] = json!([{
                "content": STANDARD.encode(bytes),
                "filename": filename,
                "type": "text/csv",
                "disposition": "attachment",
            }]);
        }
        payload
    }

    async fn read_attachment(path: &Path) -> Result<Vec<u8>, NotifyError> {
        tokio::fs::read(path).await.map_err(|source| NotifyError::Attachment {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let attachment = if self.attach_report {
            Some(Self::read_attachment(&notification.report_path).await?)
        } else {
            None
        };
        let filename = notification
            .report_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let payload = self.payload(
            notification,
            attachment.as_deref().map(|bytes| (filename.as_str(), bytes)),
        );

        debug!("Sending report notification to {}", self.to);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Notification sent to {} (HTTP {})", self.to, status.as_u16());
        Ok(())
    }
}

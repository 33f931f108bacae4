use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::Mailbox;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailReceipt {
    pub accepted_at: String,
    pub response: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("mail transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError>;
}

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| MailError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// Keeps every accepted message in memory instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    fail_after: Option<usize>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `accepted` messages, then fails every later send.
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_after: Some(accepted),
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError> {
        parse_mailbox(&mail.to)?;

        let mut sent = self.sent.lock().await;
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(MailError::Transport("connection refused".to_string()));
        }

        info!(to = %mail.to, subject = %mail.subject, attachments = mail.attachments.len(), "mail recorded");
        sent.push(mail.clone());
        Ok(MailReceipt {
            accepted_at: Utc::now().to_rfc3339(),
            response: "250 recorded".to_string(),
        })
    }
}

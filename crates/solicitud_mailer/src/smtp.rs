use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::mailer::{parse_mailbox, MailError, MailReceipt, Mailer, OutgoingMail};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Delivers mail through an authenticated SMTP relay (implicit TLS).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        if let Some(port) = config.port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Probes the relay connection and authentication.
    pub async fn test_connection(&self) -> Result<bool, MailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|err| MailError::Transport(err.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<MailReceipt, MailError> {
        let message = build_message(&self.from, mail).await?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| MailError::Transport(err.to_string()))?;

        let response = response.message().collect::<Vec<_>>().join(" ");
        info!(to = %mail.to, subject = %mail.subject, response = %response, "mail delivered");
        Ok(MailReceipt {
            accepted_at: Utc::now().to_rfc3339(),
            response,
        })
    }
}

/// Builds a plain-text/HTML message, wrapped in `multipart/mixed` when it
/// carries attachments. Attachment bodies are read from disk here.
pub async fn build_message(from: &Mailbox, mail: &OutgoingMail) -> Result<Message, MailError> {
    let to = parse_mailbox(&mail.to)?;
    let body = MultiPart::alternative_plain_html(mail.text.clone(), mail.html.clone());
    let builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(mail.subject.clone());

    let message = if mail.attachments.is_empty() {
        builder.multipart(body)
    } else {
        let mut mixed = MultiPart::mixed().multipart(body);
        for attachment in &mail.attachments {
            let bytes = tokio::fs::read(&attachment.path)
                .await
                .map_err(|source| MailError::Attachment {
                    path: attachment.path.clone(),
                    source,
                })?;
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse(FALLBACK_CONTENT_TYPE))
                .map_err(|err| MailError::Build(err.to_string()))?;
            mixed = mixed.singlepart(
                Attachment::new(attachment.filename.clone()).body(bytes, content_type),
            );
        }
        builder.multipart(mixed)
    };

    message.map_err(|err| MailError::Build(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::build_message;
    use crate::mailer::{MailAttachment, MailError, OutgoingMail};
    use lettre::message::Mailbox;

    fn sender() -> Mailbox {
        "Oficialia <oficialia@example.com>".parse().expect("mailbox")
    }

    #[tokio::test]
    async fn attachments_are_read_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut attachments = Vec::new();
        for (name, content_type) in [
            ("selfie.jpg", "image/jpeg"),
            ("ine.png", "image/png"),
            ("acta.pdf", "application/pdf"),
            ("oficio.pdf", "not-a-type"),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"payload").expect("write");
            attachments.push(MailAttachment {
                filename: name.to_string(),
                content_type: content_type.to_string(),
                path,
            });
        }

        let mail = OutgoingMail {
            to: "admin@example.com".to_string(),
            subject: "Solicitud recibida con Folio: 123456".to_string(),
            text: "texto".to_string(),
            html: "<p>texto</p>".to_string(),
            attachments,
        };

        let message = build_message(&sender(), &mail).await.expect("message");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert_eq!(raw.matches("Content-Disposition: attachment").count(), 4);
        assert!(raw.contains("filename=\"acta.pdf\""));
        assert!(raw.contains("Content-Type: application/pdf"));
        assert!(raw.contains("Content-Type: application/octet-stream"));
        assert!(raw.contains("To: admin@example.com"));
    }

    #[tokio::test]
    async fn plain_mail_has_no_attachment_parts() {
        let mail = OutgoingMail {
            to: "ana@example.com".to_string(),
            subject: "Folio".to_string(),
            text: "texto".to_string(),
            html: "<p>texto</p>".to_string(),
            attachments: Vec::new(),
        };
        let message = build_message(&sender(), &mail).await.expect("message");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        assert!(!raw.contains("Content-Disposition: attachment"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn missing_attachment_file_fails() {
        let mail = OutgoingMail {
            to: "admin@example.com".to_string(),
            subject: "Folio".to_string(),
            text: String::new(),
            html: String::new(),
            attachments: vec![MailAttachment {
                filename: "acta.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                path: "/nonexistent/acta.pdf".into(),
            }],
        };
        let err = build_message(&sender(), &mail).await.expect_err("missing file");
        assert!(matches!(err, MailError::Attachment { .. }));
    }
}

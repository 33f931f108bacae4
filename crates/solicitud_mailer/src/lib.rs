pub mod mailer;
pub mod smtp;

pub use mailer::{InMemoryMailer, MailAttachment, MailError, MailReceipt, Mailer, OutgoingMail};
pub use smtp::{build_message, SmtpConfig, SmtpMailer};

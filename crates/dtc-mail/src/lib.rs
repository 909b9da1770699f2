//! DTC-MAIL: Report delivery over SMTP
//!
//! One message per report: a plain-text body with the PDF attached. Without
//! mail settings nothing is sent and the caller is told so.

use dtc_core::MailSettings;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while sending a report
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

/// Build the message without sending it
pub fn build_message(
    sender: &str,
    recipient: &str,
    subject: &str,
    body: &str,
    pdf_path: &Path,
) -> Result<Message, MailError> {
    let pdf = std::fs::read(pdf_path).map_err(|source| MailError::Attachment {
        path: pdf_path.display().to_string(),
        source,
    })?;
    let filename = pdf_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "report.pdf".to_string());

    let attachment = Attachment::new(filename).body(pdf, ContentType::parse("application/pdf")?);

    let message = Message::builder()
        .from(mailbox(sender)?)
        .to(mailbox(recipient)?)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(attachment),
        )?;
    Ok(message)
}

fn transport(settings: &MailSettings) -> Result<SmtpTransport, MailError> {
    let builder = if settings.use_tls {
        SmtpTransport::starttls_relay(&settings.server)?
    } else {
        SmtpTransport::builder_dangerous(&settings.server)
    };

    let builder = builder.port(settings.port).timeout(Some(SMTP_TIMEOUT));
    let builder = if settings.username.is_empty() {
        builder
    } else {
        builder.credentials(Credentials::new(
            settings.username.clone(),
            settings.password.clone(),
        ))
    };

    Ok(builder.build())
}

/// Send `pdf_path` to `recipient`.
///
/// `Ok(false)` when mail is not configured, `Ok(true)` once the server
/// accepted the message.
pub fn send_report(
    recipient: &str,
    subject: &str,
    body: &str,
    pdf_path: &Path,
    settings: Option<&MailSettings>,
) -> Result<bool, MailError> {
    let Some(settings) = settings else {
        warn!("mail settings not configured, skipping email to {}", recipient);
        return Ok(false);
    };

    let message = build_message(&settings.sender, recipient, subject, body, pdf_path)?;
    transport(settings)?.send(&message)?;

    info!("sent report {} to {}", pdf_path.display(), recipient);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("0f8e2c4b.pdf");
        std::fs::write(&path, b"%PDF-1.3\n%%EOF\n").unwrap();
        path
    }

    #[test]
    fn test_without_settings_nothing_is_sent() {
        let dir = tempfile::tempdir().unwrap();
        let sent = send_report("a@example.com", "Subject", "Body", &pdf(dir.path()), None).unwrap();
        assert!(!sent);
    }

    #[test]
    fn test_message_carries_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let message = build_message(
            "reports@example.com",
            "owner@example.com",
            "Vehicle diagnostic report for WVWZZZ",
            "Report ID: 0f8e2c4b",
            &pdf(dir.path()),
        )
        .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: owner@example.com"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("0f8e2c4b.pdf"));
    }

    #[test]
    fn test_bad_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_message("reports@example.com", "not an address", "S", "B", &pdf(dir.path()));
        assert!(matches!(result, Err(MailError::Address { .. })));
    }

    #[test]
    fn test_missing_attachment() {
        let result = build_message(
            "reports@example.com",
            "owner@example.com",
            "S",
            "B",
            Path::new("/nonexistent/report.pdf"),
        );
        assert!(matches!(result, Err(MailError::Attachment { .. })));
    }
}

//! Outbound submission notifications.
//!
//! Delivery is best effort: a failed send is logged and reported to the
//! caller as `emailed: false`, never as a failed submission.

pub mod format;
pub mod gmail;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmailConfig;
use crate::error::NotificationError;
use crate::store::SubmissionRecord;

pub use gmail::GmailTransport;

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutgoingMessage {
    /// Headers and body joined with CRLF. An empty `Cc` header is omitted.
    pub fn to_rfc822(&self) -> String {
        let mut lines = vec![format!("From: {}", self.from), format!("To: {}", self.to)];
        if let Some(cc) = self.cc.as_deref().filter(|cc| !cc.is_empty()) {
            lines.push(format!("Cc: {cc}"));
        }
        lines.push(format!("Subject: {}", self.subject));
        lines.push("MIME-Version: 1.0".to_string());
        lines.push("Content-Type: text/plain; charset=\"UTF-8\"".to_string());
        lines.push(String::new());
        lines.push(self.body.clone());
        lines.join("\r\n")
    }
}

/// Delivers a composed message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotificationError>;
}

/// Formats submission records and hands them to a [`MailTransport`].
pub struct SubmissionNotifier {
    transport: Arc<dyn MailTransport>,
    from: String,
    to: String,
    cc: Option<String>,
}

impl SubmissionNotifier {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        from: impl Into<String>,
        to: impl Into<String>,
        cc: Option<String>,
    ) -> Self {
        Self {
            transport,
            from: from.into(),
            to: to.into(),
            cc,
        }
    }

    /// Notifier backed by the Gmail API.
    pub fn gmail(config: &EmailConfig) -> Self {
        Self::new(
            Arc::new(GmailTransport::new(config)),
            config.from.clone(),
            config.to.clone(),
            config.cc.clone(),
        )
    }

    pub fn compose(&self, record: &SubmissionRecord) -> OutgoingMessage {
        OutgoingMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            cc: self.cc.clone(),
            subject: format::subject(record),
            body: format::body(record),
        }
    }

    /// Send the notification for `record`. Returns whether it was delivered.
    pub async fn notify(&self, record: &SubmissionRecord) -> bool {
        let message = self.compose(record);
        match self.transport.send(&message).await {
            Ok(()) => {
                tracing::info!(submission_id = %record.submission_id, "Submission email sent");
                true
            }
            Err(e) => {
                tracing::warn!(
                    submission_id = %record.submission_id,
                    error = %e,
                    "Submission email failed"
                );
                false
            }
        }
    }
}

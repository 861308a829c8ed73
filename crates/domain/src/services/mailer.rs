//! Outbound email abstraction.
//!
//! Handlers depend on [`EmailSender`]; the API crate provides the real
//! provider-backed implementation and tests use [`MockEmailSender`].

use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;

use crate::models::email_log::EmailType;

/// Errors a sender can report for one message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailerError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// A rendered transactional email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub email_type: EmailType,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub provider_message_id: Option<String>,
}

/// Sends transactional email.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, MailerError>;
}

/// Records messages instead of sending them.
#[derive(Debug, Default)]
pub struct MockEmailSender {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that rejects every message.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_of_type(&self, email_type: EmailType) -> Vec<OutboundEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.email_type == email_type)
            .collect()
    }
}

#[async_trait::async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, MailerError> {
        if self.simulate_failure {
            tracing::warn!(
                to = %email.to,
                email_type = %email.email_type,
                "Mock email sender simulating failure"
            );
            return Err(MailerError::SendFailed("Simulated failure".to_string()));
        }

        tracing::info!(
            to = %email.to,
            email_type = %email.email_type,
            subject = %email.subject,
            "Mock: Would send email"
        );

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailerError::Provider("mock mailbox poisoned".to_string()))?;
        sent.push(email.clone());
        Ok(SendReceipt {
            provider_message_id: Some(format!("mock-{}", sent.len())),
        })
    }
}

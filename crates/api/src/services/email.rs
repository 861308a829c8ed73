//! Email provider integration.
//!
//! Supports two providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses the SendGrid v3 mail API

use async_trait::async_trait;
use domain::services::{EmailSender, MailerError, OutboundEmail, SendReceipt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Provider-backed [`EmailSender`].
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Console provider - logs the message instead of delivering it.
    fn send_console(&self, email: &OutboundEmail) -> SendReceipt {
        info!(
            to = %email.to,
            to_name = ?email.to_name,
            email_type = %email.email_type,
            subject = %email.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %email.body_text, "Email body");
        SendReceipt::default()
    }

    async fn send_sendgrid(&self, email: &OutboundEmail) -> Result<SendReceipt, MailerError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(MailerError::NotConfigured);
        }

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&sendgrid_body(&self.config, email))
            .send()
            .await
            .map_err(|e| MailerError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            info!(
                to = %email.to,
                email_type = %email.email_type,
                message_id = ?message_id,
                "Email sent via SendGrid"
            );
            Ok(SendReceipt {
                provider_message_id: message_id,
            })
        } else {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(MailerError::Provider(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send(&self, email: &OutboundEmail) -> Result<SendReceipt, MailerError> {
        if !shared::validation::is_valid_email(&email.to) {
            return Err(MailerError::InvalidAddress(email.to.clone()));
        }

        if !self.config.enabled {
            debug!(
                to = %email.to,
                email_type = %email.email_type,
                "Email service disabled, skipping send"
            );
            return Err(MailerError::NotConfigured);
        }

        match self.config.provider.as_str() {
            "console" => Ok(self.send_console(email)),
            "sendgrid" => self.send_sendgrid(email).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(MailerError::NotConfigured)
            }
        }
    }
}

fn sendgrid_body(config: &EmailConfig, email: &OutboundEmail) -> serde_json::Value {
    let mut to = json!({ "email": email.to });
    if let Some(name) = &email.to_name {
        to["name"] = json!(name);
    }

    let mut content = vec![json!({ "type": "text/plain", "value": email.body_text })];
    if let Some(html) = &email.body_html {
        content.push(json!({ "type": "text/html", "value": html }));
    }

    json!({
        "personalizations": [{ "to": [to] }],
        "from": {
            "email": config.sender_email,
            "name": config.sender_name
        },
        "subject": email.subject,
        "content": content,
        "categories": [email.email_type.as_str()]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::EmailType;

    fn config(enabled: bool, provider: &str) -> EmailConfig {
        EmailConfig {
            enabled,
            provider: provider.to_string(),
            sender_email: "hello@example.org".to_string(),
            sender_name: "Community Hub".to_string(),
            ..EmailConfig::default()
        }
    }

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            to_name: Some("Sam".to_string()),
            email_type: EmailType::EventReminder,
            subject: "See you tomorrow".to_string(),
            body_text: "Hello".to_string(),
            body_html: None,
        }
    }

    #[tokio::test]
    async fn test_console_provider_accepts() {
        let service = EmailService::new(config(true, "console")).unwrap();
        let receipt = service.send(&email("sam@example.com")).await.unwrap();
        assert!(receipt.provider_message_id.is_none());
    }

    #[tokio::test]
    async fn test_disabled_service_reports_not_configured() {
        let service = EmailService::new(config(false, "console")).unwrap();
        assert!(!service.is_enabled());
        let result = service.send(&email("sam@example.com")).await;
        assert_eq!(result, Err(MailerError::NotConfigured));
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected() {
        let service = EmailService::new(config(true, "console")).unwrap();
        let result = service.send(&email("not-an-address")).await;
        assert!(matches!(result, Err(MailerError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_not_configured() {
        let service = EmailService::new(config(true, "sendgrid")).unwrap();
        let result = service.send(&email("sam@example.com")).await;
        assert_eq!(result, Err(MailerError::NotConfigured));
    }

    #[test]
    fn test_sendgrid_body_shape() {
        let body = sendgrid_body(&config(true, "sendgrid"), &email("sam@example.com"));
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "sam@example.com");
        assert_eq!(body["personalizations"][0]["to"][0]["name"], "Sam");
        assert_eq!(body["from"]["name"], "Community Hub");
        assert_eq!(body["content"].as_array().unwrap().len(), 1);
        assert_eq!(body["categories"][0], "event_reminder");
    }
}

//! Logged email dispatch.
//!
//! Every send is preceded by an `email_logs` claim. For batch email types the
//! claim is unique per (registration, type), so a second run of the same
//! batch skips recipients that were already handled.

use domain::models::EmailType;
use domain::services::{EmailSender, OutboundEmail};
use persistence::repositories::{EmailLogRepository, NewEmailLog};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::middleware::metrics::record_email;
use crate::services::email_templates::EmailTemplates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed,
    /// Already claimed by an earlier run.
    Skipped,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::Failed => "failed",
            DispatchOutcome::Skipped => "skipped",
        }
    }
}

/// Links emails to the records they concern.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailContext {
    pub registration_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
}

impl EmailContext {
    pub fn registration(registration_id: Uuid, event_id: Uuid) -> Self {
        Self {
            registration_id: Some(registration_id),
            event_id: Some(event_id),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    logs: EmailLogRepository,
    templates: EmailTemplates,
}

impl Notifier {
    pub fn new(pool: PgPool, sender: Arc<dyn EmailSender>, templates: EmailTemplates) -> Self {
        Self {
            sender,
            logs: EmailLogRepository::new(pool),
            templates,
        }
    }

    pub fn templates(&self) -> &EmailTemplates {
        &self.templates
    }

    /// Claim, send and record one email.
    ///
    /// Provider failures are recorded on the log row and reported as
    /// [`DispatchOutcome::Failed`]; only database errors are returned.
    pub async fn dispatch(
        &self,
        email: &OutboundEmail,
        context: EmailContext,
    ) -> Result<DispatchOutcome, sqlx::Error> {
        let claim = NewEmailLog {
            recipient: email.to.clone(),
            email_type: email.email_type.into(),
            subject: email.subject.clone(),
            registration_id: context.registration_id,
            event_id: context.event_id,
        };

        let Some(log_id) = self.logs.claim(&claim).await? else {
            debug!(
                to = %email.to,
                email_type = %email.email_type,
                registration_id = ?context.registration_id,
                "Email already claimed, skipping"
            );
            return Ok(self.finish(email.email_type, DispatchOutcome::Skipped));
        };

        match self.sender.send(email).await {
            Ok(receipt) => {
                self.logs
                    .mark_sent(log_id, receipt.provider_message_id.as_deref())
                    .await?;
                Ok(self.finish(email.email_type, DispatchOutcome::Sent))
            }
            Err(e) => {
                warn!(
                    to = %email.to,
                    email_type = %email.email_type,
                    error = %e,
                    "Email send failed"
                );
                self.logs.mark_failed(log_id, &e.to_string()).await?;
                Ok(self.finish(email.email_type, DispatchOutcome::Failed))
            }
        }
    }

    /// Dispatch from a request path where the email must not fail the request.
    pub async fn dispatch_best_effort(
        &self,
        email: &OutboundEmail,
        context: EmailContext,
    ) -> DispatchOutcome {
        match self.dispatch(email, context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    to = %email.to,
                    email_type = %email.email_type,
                    error = %e,
                    "Could not log email"
                );
                self.finish(email.email_type, DispatchOutcome::Failed)
            }
        }
    }

    fn finish(&self, email_type: EmailType, outcome: DispatchOutcome) -> DispatchOutcome {
        record_email(email_type.as_str(), outcome.as_str());
        outcome
    }
}

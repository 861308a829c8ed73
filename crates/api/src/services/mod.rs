//! Integrations and workflows shared by routes and background jobs.

pub mod batch;
pub mod donations;
pub mod email;
pub mod email_templates;
pub mod notifier;
pub mod payments;

pub use batch::{BatchEmailer, BatchError};
pub use donations::{DonationWebhookProcessor, WebhookError, WebhookOutcome};
pub use email::EmailService;
pub use email_templates::EmailTemplates;
pub use notifier::{DispatchOutcome, EmailContext, Notifier};
pub use payments::{CheckoutParams, PaymentError, PaymentsClient};

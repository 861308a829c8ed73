//! Applies verified payment webhooks to donors, donations and subscriptions.
//!
//! Replays are harmless: every insert is keyed by a processor reference and
//! a duplicate is reported as [`WebhookOutcome::Duplicate`].

use chrono::{DateTime, Utc};
use domain::models::donation::SubscriptionStatus;
use domain::models::DonationFrequency;
use persistence::repositories::{DonationRepository, NewDonation, NewSubscription};
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::metrics::{record_donation, record_webhook_event};
use crate::services::payments::{
    from_unix, CheckoutSession, Invoice, Subscription, WebhookEvent,
};

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const INVOICE_PAID: &str = "invoice.payment_succeeded";
pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Malformed {event_type} object: {source}")]
    Malformed {
        event_type: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    DonationRecorded,
    DonorRecorded,
    SubscriptionRecorded,
    SubscriptionCancelled,
    Duplicate,
    /// Subscription event for a donor we have not seen yet.
    DonorMissing,
    /// Required fields were absent; acknowledged without changes.
    Incomplete,
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::DonationRecorded => "donation_recorded",
            WebhookOutcome::DonorRecorded => "donor_recorded",
            WebhookOutcome::SubscriptionRecorded => "subscription_recorded",
            WebhookOutcome::SubscriptionCancelled => "subscription_cancelled",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::DonorMissing => "donor_missing",
            WebhookOutcome::Incomplete => "incomplete",
            WebhookOutcome::Ignored => "ignored",
        }
    }
}

#[derive(Clone)]
pub struct DonationWebhookProcessor {
    repo: DonationRepository,
    default_currency: String,
}

impl DonationWebhookProcessor {
    pub fn new(pool: PgPool, default_currency: impl Into<String>) -> Self {
        Self {
            repo: DonationRepository::new(pool),
            default_currency: default_currency.into(),
        }
    }

    pub async fn process(
        &self,
        event: &WebhookEvent,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let outcome = match event.event_type.as_str() {
            CHECKOUT_COMPLETED => self.checkout_completed(parse(event)?).await?,
            INVOICE_PAID => self.invoice_paid(parse(event)?).await?,
            SUBSCRIPTION_CREATED => self.subscription_created(parse(event)?).await?,
            SUBSCRIPTION_DELETED => self.subscription_deleted(parse(event)?, now).await?,
            _ => WebhookOutcome::Ignored,
        };

        record_webhook_event(&event.event_type, outcome.as_str());
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            outcome = outcome.as_str(),
            "Payment webhook processed"
        );
        Ok(outcome)
    }

    async fn checkout_completed(
        &self,
        session: CheckoutSession,
    ) -> Result<WebhookOutcome, WebhookError> {
        let gift_aid = session.gift_aid();
        let donor_id = match session.donor_email() {
            Some(email) => Some(
                self.repo
                    .upsert_donor(
                        &email,
                        session.donor_name().as_deref(),
                        gift_aid,
                        session.customer_id().as_deref(),
                    )
                    .await?
                    .id,
            ),
            None => {
                warn!(session_id = %session.id, "Checkout completed without a donor email");
                None
            }
        };

        // Recurring payments are recorded per invoice.
        if session.is_subscription() {
            return Ok(if donor_id.is_some() {
                WebhookOutcome::DonorRecorded
            } else {
                WebhookOutcome::Incomplete
            });
        }

        let Some(amount_minor) = session.amount_total else {
            warn!(session_id = %session.id, "Checkout completed without amount_total");
            return Ok(WebhookOutcome::Incomplete);
        };

        let donation = NewDonation {
            donor_id,
            amount_minor,
            currency: session
                .currency
                .clone()
                .unwrap_or_else(|| self.default_currency.clone()),
            frequency: DonationFrequency::OneOff.into(),
            gift_aid,
            provider_session_id: Some(session.id.clone()),
            provider_payment_id: session.payment_intent_id(),
            provider_invoice_id: None,
        };
        self.record_donation(&donation, DonationFrequency::OneOff).await
    }

    async fn invoice_paid(&self, invoice: Invoice) -> Result<WebhookOutcome, WebhookError> {
        if invoice.amount_paid <= 0 {
            return Ok(WebhookOutcome::Ignored);
        }

        let gift_aid = invoice.gift_aid();
        let donor_id: Option<Uuid> = match invoice.donor_email() {
            Some(email) => Some(
                self.repo
                    .upsert_donor(
                        &email,
                        invoice.donor_name().as_deref(),
                        gift_aid,
                        invoice.customer_id().as_deref(),
                    )
                    .await?
                    .id,
            ),
            None => None,
        };

        let frequency = if invoice.subscription_id().is_some() {
            DonationFrequency::Monthly
        } else {
            DonationFrequency::OneOff
        };

        let donation = NewDonation {
            donor_id,
            amount_minor: invoice.amount_paid,
            currency: invoice
                .currency
                .clone()
                .unwrap_or_else(|| self.default_currency.clone()),
            frequency: frequency.into(),
            gift_aid,
            provider_session_id: None,
            provider_payment_id: invoice.payment_intent_id(),
            provider_invoice_id: Some(invoice.id.clone()),
        };
        self.record_donation(&donation, frequency).await
    }

    async fn subscription_created(
        &self,
        subscription: Subscription,
    ) -> Result<WebhookOutcome, WebhookError> {
        let donor = match subscription.donor_email() {
            Some(email) => self.repo.find_donor_by_email(&email).await?,
            None => None,
        };
        let Some(donor) = donor else {
            warn!(
                subscription_id = %subscription.id,
                "Subscription created for unknown donor, not recorded"
            );
            return Ok(WebhookOutcome::DonorMissing);
        };

        let Some(amount_minor) = subscription.amount_minor() else {
            warn!(subscription_id = %subscription.id, "Subscription without a unit amount");
            return Ok(WebhookOutcome::Incomplete);
        };

        let record = NewSubscription {
            donor_id: donor.id,
            provider_subscription_id: subscription.id.clone(),
            amount_minor,
            currency: subscription
                .currency()
                .unwrap_or_else(|| self.default_currency.clone()),
            status: SubscriptionStatus::from_provider(&subscription.status).into(),
            current_period_start: from_unix(subscription.current_period_start),
            current_period_end: from_unix(subscription.current_period_end),
        };

        Ok(match self.repo.insert_subscription(&record).await? {
            Some(_) => WebhookOutcome::SubscriptionRecorded,
            None => WebhookOutcome::Duplicate,
        })
    }

    async fn subscription_deleted(
        &self,
        subscription: Subscription,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let ended_at = subscription.ended_at().unwrap_or(now);
        Ok(
            match self.repo.cancel_subscription(&subscription.id, ended_at).await? {
                Some(_) => WebhookOutcome::SubscriptionCancelled,
                None => {
                    info!(
                        subscription_id = %subscription.id,
                        "Cancelled subscription not on record"
                    );
                    WebhookOutcome::Ignored
                }
            },
        )
    }

    async fn record_donation(
        &self,
        donation: &NewDonation,
        frequency: DonationFrequency,
    ) -> Result<WebhookOutcome, WebhookError> {
        Ok(match self.repo.insert_donation(donation).await? {
            Some(_) => {
                record_donation(frequency.as_str(), donation.amount_minor);
                WebhookOutcome::DonationRecorded
            }
            None => WebhookOutcome::Duplicate,
        })
    }
}

fn parse<T: DeserializeOwned>(event: &WebhookEvent) -> Result<T, WebhookError> {
    serde_json::from_value(event.data.object.clone()).map_err(|source| WebhookError::Malformed {
        event_type: event.event_type.clone(),
        source,
    })
}

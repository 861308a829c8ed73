//! Payment processor integration: hosted checkout sessions and signed webhooks.
//!
//! Speaks the Stripe REST dialect (form-encoded requests, `Stripe-Signature`
//! webhook header).

use chrono::{DateTime, Utc};
use domain::models::donation::{CreateCheckoutResponse, DonationFrequency};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::PaymentsConfig;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Metadata keys written at checkout and read back from webhooks.
pub mod metadata_keys {
    pub const DONOR_EMAIL: &str = "donor_email";
    pub const DONOR_NAME: &str = "donor_name";
    pub const GIFT_AID: &str = "gift_aid";
    pub const FREQUENCY: &str = "frequency";
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Missing webhook signature")]
    MissingSignature,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Minimum donation is £1.00")]
    AmountTooSmall,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payment provider error: {0}")]
    Provider(String),
}

/// Checks `t=<unix>,v1=<hex>` against HMAC-SHA256 of `"{t}.{payload}"`.
///
/// Any of several `v1` entries may match (the provider sends one per active
/// secret during rotation).
pub fn verify_webhook_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<(), PaymentError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(PaymentError::MissingSignature)?;

    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::InvalidSignature)?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature);
    }
    if (now.timestamp() - timestamp).abs() > tolerance_secs {
        return Err(PaymentError::TimestampOutOfTolerance);
    }

    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(payload);

    if signatures
        .iter()
        .any(|sig| shared::crypto::verify_hmac_sha256_hex(secret, &signed, sig))
    {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature)
    }
}

/// Envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub mode: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    customer: Option<serde_json::Value>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    payment_intent: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_subscription(&self) -> bool {
        self.mode.as_deref() == Some("subscription")
    }

    pub fn customer_id(&self) -> Option<String> {
        object_id(self.customer.as_ref())
    }

    pub fn payment_intent_id(&self) -> Option<String> {
        object_id(self.payment_intent.as_ref())
    }

    /// Email given on our form, else the one typed into the hosted page.
    pub fn donor_email(&self) -> Option<String> {
        metadata_email(&self.metadata)
            .or_else(|| {
                self.customer_details
                    .as_ref()
                    .and_then(|d| d.email.as_deref())
                    .and_then(valid_email)
            })
            .or_else(|| self.customer_email.as_deref().and_then(valid_email))
    }

    pub fn donor_name(&self) -> Option<String> {
        non_empty(self.metadata.get(metadata_keys::DONOR_NAME)).or_else(|| {
            self.customer_details
                .as_ref()
                .and_then(|d| non_empty(d.name.as_ref()))
        })
    }

    pub fn gift_aid(&self) -> bool {
        metadata_flag(&self.metadata, metadata_keys::GIFT_AID)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParentMetadata {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub amount_paid: i64,
    pub currency: Option<String>,
    #[serde(default)]
    customer: Option<serde_json::Value>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    #[serde(default)]
    subscription: Option<serde_json::Value>,
    #[serde(default)]
    payment_intent: Option<serde_json::Value>,
    pub subscription_details: Option<ParentMetadata>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Invoice {
    pub fn customer_id(&self) -> Option<String> {
        object_id(self.customer.as_ref())
    }

    pub fn subscription_id(&self) -> Option<String> {
        object_id(self.subscription.as_ref())
    }

    pub fn payment_intent_id(&self) -> Option<String> {
        object_id(self.payment_intent.as_ref())
    }

    /// Subscription metadata first, then the invoice's own.
    fn metadata_value(&self, key: &str) -> Option<&String> {
        self.subscription_details
            .as_ref()
            .and_then(|d| d.metadata.get(key))
            .or_else(|| self.metadata.get(key))
    }

    pub fn donor_email(&self) -> Option<String> {
        self.metadata_value(metadata_keys::DONOR_EMAIL)
            .and_then(|e| valid_email(e))
            .or_else(|| self.customer_email.as_deref().and_then(valid_email))
    }

    pub fn donor_name(&self) -> Option<String> {
        non_empty(self.metadata_value(metadata_keys::DONOR_NAME))
            .or_else(|| non_empty(self.customer_name.as_ref()))
    }

    pub fn gift_aid(&self) -> bool {
        self.metadata_value(metadata_keys::GIFT_AID)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Price {
    pub unit_amount: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItem {
    pub price: Option<Price>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub canceled_at: Option<i64>,
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

impl Subscription {
    pub fn donor_email(&self) -> Option<String> {
        metadata_email(&self.metadata)
    }

    /// Recurring amount in minor units: unit price times quantity of the first item.
    pub fn amount_minor(&self) -> Option<i64> {
        let item = self.items.data.first()?;
        let unit = item.price.as_ref()?.unit_amount?;
        Some(unit * item.quantity.unwrap_or(1))
    }

    pub fn currency(&self) -> Option<String> {
        self.currency.clone().or_else(|| {
            self.items
                .data
                .first()
                .and_then(|i| i.price.as_ref())
                .and_then(|p| p.currency.clone())
        })
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
            .or(self.canceled_at)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Unix seconds to UTC.
pub fn from_unix(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Ids arrive either as a bare string or as an expanded object with an `id`.
fn object_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(id) => Some(id.clone()),
        serde_json::Value::Object(map) => map.get("id")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn valid_email(email: &str) -> Option<String> {
    let normalized = shared::validation::normalize_email(email);
    shared::validation::is_valid_email(&normalized).then_some(normalized)
}

fn metadata_email(metadata: &HashMap<String, String>) -> Option<String> {
    metadata
        .get(metadata_keys::DONOR_EMAIL)
        .and_then(|e| valid_email(e))
}

fn metadata_flag(metadata: &HashMap<String, String>, key: &str) -> bool {
    metadata
        .get(key)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validated input for a new checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub amount_minor: i64,
    pub frequency: DonationFrequency,
    pub gift_aid: bool,
    pub donor_email: Option<String>,
    pub donor_name: Option<String>,
}

/// Form fields for `POST /v1/checkout/sessions`.
pub fn checkout_form(config: &PaymentsConfig, params: &CheckoutParams) -> Vec<(String, String)> {
    let monthly = params.frequency == DonationFrequency::Monthly;
    let mut form: Vec<(String, String)> = vec![
        (
            "mode".into(),
            if monthly { "subscription" } else { "payment" }.into(),
        ),
        ("success_url".into(), config.success_url.clone()),
        ("cancel_url".into(), config.cancel_url.clone()),
        ("line_items[0][quantity]".into(), "1".into()),
        (
            "line_items[0][price_data][currency]".into(),
            config.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][unit_amount]".into(),
            params.amount_minor.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".into(),
            if monthly { "Monthly donation" } else { "Donation" }.into(),
        ),
    ];

    if monthly {
        form.push((
            "line_items[0][price_data][recurring][interval]".into(),
            "month".into(),
        ));
    }

    if let Some(email) = &params.donor_email {
        form.push(("customer_email".into(), email.clone()));
    }

    let mut metadata = vec![
        (metadata_keys::GIFT_AID, params.gift_aid.to_string()),
        (metadata_keys::FREQUENCY, params.frequency.as_str().to_string()),
    ];
    if let Some(email) = &params.donor_email {
        metadata.push((metadata_keys::DONOR_EMAIL, email.clone()));
    }
    if let Some(name) = &params.donor_name {
        metadata.push((metadata_keys::DONOR_NAME, name.clone()));
    }

    for (key, value) in &metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
        // Subscription events only carry the subscription's own metadata.
        if monthly {
            form.push((format!("subscription_data[metadata][{key}]"), value.clone()));
        }
    }

    form
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionCreated {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

/// HTTP client for the payment processor.
#[derive(Clone)]
pub struct PaymentsClient {
    config: Arc<PaymentsConfig>,
    client: reqwest::Client,
}

impl PaymentsClient {
    pub fn new(config: PaymentsConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &PaymentsConfig {
        &self.config
    }

    /// Verify a webhook delivery against the configured signing secret.
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, PaymentError> {
        if self.config.webhook_secret.is_empty() {
            return Err(PaymentError::NotConfigured("Webhook secret"));
        }
        verify_webhook_signature(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            now,
        )?;
        serde_json::from_slice(payload).map_err(|e| PaymentError::MalformedPayload(e.to_string()))
    }

    /// Open a hosted checkout page for a donation.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CreateCheckoutResponse, PaymentError> {
        if params.amount_minor < shared::validation::MIN_DONATION_MINOR_UNITS {
            return Err(PaymentError::AmountTooSmall);
        }
        if self.config.secret_key.is_empty() {
            return Err(PaymentError::NotConfigured("Payments"));
        }

        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.api_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&checkout_form(&self.config, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| status.to_string());
            error!(status = %status, error = %message, "Checkout session creation failed");
            return Err(PaymentError::Provider(message));
        }

        let session: CheckoutSessionCreated = response.json().await?;
        info!(
            session_id = %session.id,
            amount_minor = params.amount_minor,
            frequency = %params.frequency,
            "Checkout session created"
        );
        Ok(CreateCheckoutResponse {
            session_id: session.id,
            url: session.url,
        })
    }
}

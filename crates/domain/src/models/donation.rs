//! Donation domain models: donors, one-off and recurring gifts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Whether a gift is one-off or recurring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationFrequency {
    #[serde(alias = "once", alias = "one-off", alias = "single")]
    OneOff,
    Monthly,
}

impl DonationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationFrequency::OneOff => "one_off",
            DonationFrequency::Monthly => "monthly",
        }
    }

    /// Parses the frequency stored in payment-processor metadata.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("monthly") => DonationFrequency::Monthly,
            _ => DonationFrequency::OneOff,
        }
    }
}

impl fmt::Display for DonationFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Status of a recurring donation, mirroring the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
    Incomplete,
}

impl SubscriptionStatus {
    /// Maps a payment-processor subscription status string.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" | "trialing" => SubscriptionStatus::Active,
            "past_due" | "unpaid" => SubscriptionStatus::PastDue,
            "canceled" | "cancelled" | "incomplete_expired" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Incomplete,
        }
    }
}

/// A person who has given, identified by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub gift_aid: bool,
    pub provider_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single completed (or attempted) payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    /// Amount in minor currency units (pence).
    pub amount_minor: i64,
    pub currency: String,
    pub frequency: DonationFrequency,
    pub gift_aid: bool,
    pub status: DonationStatus,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub provider_invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Amount in major currency units.
    pub fn amount(&self) -> f64 {
        shared::validation::from_minor_units(self.amount_minor)
    }
}

/// A recurring donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationSubscription {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub provider_subscription_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// Amount in major units, e.g. `10.50`.
    pub amount: f64,
    pub frequency: DonationFrequency,
    #[serde(default)]
    pub gift_aid: bool,
    #[validate(custom(function = "shared::validation::validate_email_shape"))]
    pub donor_email: Option<String>,
    #[validate(length(max = 100, message = "Donor name must be at most 100 characters"))]
    pub donor_name: Option<String>,
}

/// Reference to the hosted checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Webhook acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_aliases() {
        for raw in ["\"one_off\"", "\"once\"", "\"one-off\""] {
            let freq: DonationFrequency = serde_json::from_str(raw).unwrap();
            assert_eq!(freq, DonationFrequency::OneOff);
        }
        let freq: DonationFrequency = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(freq, DonationFrequency::Monthly);
        assert!(serde_json::from_str::<DonationFrequency>("\"yearly\"").is_err());
    }

    #[test]
    fn test_frequency_from_metadata() {
        assert_eq!(
            DonationFrequency::from_metadata(Some("monthly")),
            DonationFrequency::Monthly
        );
        assert_eq!(DonationFrequency::from_metadata(None), DonationFrequency::OneOff);
    }

    #[test]
    fn test_subscription_status_from_provider() {
        assert_eq!(SubscriptionStatus::from_provider("active"), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::from_provider("canceled"), SubscriptionStatus::Cancelled);
        assert_eq!(SubscriptionStatus::from_provider("past_due"), SubscriptionStatus::PastDue);
        assert_eq!(
            SubscriptionStatus::from_provider("incomplete"),
            SubscriptionStatus::Incomplete
        );
    }

    #[test]
    fn test_donation_amount_major_units() {
        let donation = Donation {
            id: Uuid::new_v4(),
            donor_id: None,
            amount_minor: 2550,
            currency: "gbp".to_string(),
            frequency: DonationFrequency::OneOff,
            gift_aid: true,
            status: DonationStatus::Completed,
            provider_session_id: Some("cs_test_1".to_string()),
            provider_payment_id: None,
            provider_invoice_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(donation.amount(), 25.5);
    }

    #[test]
    fn test_checkout_request_validation() {
        let req: CreateCheckoutRequest = serde_json::from_value(serde_json::json!({
            "amount": 10,
            "frequency": "monthly",
            "giftAid": true,
            "donorEmail": "giver@example.com"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.gift_aid);

        let req: CreateCheckoutRequest = serde_json::from_value(serde_json::json!({
            "amount": 10,
            "frequency": "one_off",
            "donorEmail": "nope"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}

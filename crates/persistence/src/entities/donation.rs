//! Donor, donation and donation subscription entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::donation::SubscriptionStatus;
use domain::models::{Donation, DonationFrequency, DonationStatus, DonationSubscription, Donor};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for donation_frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "donation_frequency", rename_all = "snake_case")]
pub enum DonationFrequencyDb {
    OneOff,
    Monthly,
}

impl From<DonationFrequencyDb> for DonationFrequency {
    fn from(db: DonationFrequencyDb) -> Self {
        match db {
            DonationFrequencyDb::OneOff => DonationFrequency::OneOff,
            DonationFrequencyDb::Monthly => DonationFrequency::Monthly,
        }
    }
}

impl From<DonationFrequency> for DonationFrequencyDb {
    fn from(freq: DonationFrequency) -> Self {
        match freq {
            DonationFrequency::OneOff => DonationFrequencyDb::OneOff,
            DonationFrequency::Monthly => DonationFrequencyDb::Monthly,
        }
    }
}

/// Database enum for donation_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "donation_status", rename_all = "lowercase")]
pub enum DonationStatusDb {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl From<DonationStatusDb> for DonationStatus {
    fn from(db: DonationStatusDb) -> Self {
        match db {
            DonationStatusDb::Pending => DonationStatus::Pending,
            DonationStatusDb::Completed => DonationStatus::Completed,
            DonationStatusDb::Failed => DonationStatus::Failed,
            DonationStatusDb::Refunded => DonationStatus::Refunded,
        }
    }
}

/// Database enum for subscription_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
pub enum SubscriptionStatusDb {
    Active,
    PastDue,
    Cancelled,
    Incomplete,
}

impl From<SubscriptionStatusDb> for SubscriptionStatus {
    fn from(db: SubscriptionStatusDb) -> Self {
        match db {
            SubscriptionStatusDb::Active => SubscriptionStatus::Active,
            SubscriptionStatusDb::PastDue => SubscriptionStatus::PastDue,
            SubscriptionStatusDb::Cancelled => SubscriptionStatus::Cancelled,
            SubscriptionStatusDb::Incomplete => SubscriptionStatus::Incomplete,
        }
    }
}

impl From<SubscriptionStatus> for SubscriptionStatusDb {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Active => SubscriptionStatusDb::Active,
            SubscriptionStatus::PastDue => SubscriptionStatusDb::PastDue,
            SubscriptionStatus::Cancelled => SubscriptionStatusDb::Cancelled,
            SubscriptionStatus::Incomplete => SubscriptionStatusDb::Incomplete,
        }
    }
}

/// Database row mapping for the donors table.
#[derive(Debug, Clone, FromRow)]
pub struct DonorEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub gift_aid: bool,
    pub provider_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DonorEntity> for Donor {
    fn from(entity: DonorEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            gift_aid: entity.gift_aid,
            provider_customer_id: entity.provider_customer_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the donations table.
#[derive(Debug, Clone, FromRow)]
pub struct DonationEntity {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub frequency: DonationFrequencyDb,
    pub gift_aid: bool,
    pub status: DonationStatusDb,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub provider_invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DonationEntity> for Donation {
    fn from(entity: DonationEntity) -> Self {
        Self {
            id: entity.id,
            donor_id: entity.donor_id,
            amount_minor: entity.amount_minor,
            currency: entity.currency,
            frequency: entity.frequency.into(),
            gift_aid: entity.gift_aid,
            status: entity.status.into(),
            provider_session_id: entity.provider_session_id,
            provider_payment_id: entity.provider_payment_id,
            provider_invoice_id: entity.provider_invoice_id,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the donation_subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct DonationSubscriptionEntity {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub provider_subscription_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: SubscriptionStatusDb,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DonationSubscriptionEntity> for DonationSubscription {
    fn from(entity: DonationSubscriptionEntity) -> Self {
        Self {
            id: entity.id,
            donor_id: entity.donor_id,
            provider_subscription_id: entity.provider_subscription_id,
            amount_minor: entity.amount_minor,
            currency: entity.currency,
            status: entity.status.into(),
            current_period_start: entity.current_period_start,
            current_period_end: entity.current_period_end,
            cancelled_at: entity.cancelled_at,
            created_at: entity.created_at,
        }
    }
}

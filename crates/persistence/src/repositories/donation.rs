//! Donation repository for database operations.
//!
//! Inserts keyed by payment-processor references use `ON CONFLICT DO NOTHING`
//! so a replayed webhook leaves state unchanged.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    DonationEntity, DonationFrequencyDb, DonationSubscriptionEntity, DonorEntity,
    SubscriptionStatusDb,
};
use crate::metrics::QueryTimer;

const DONOR_COLUMNS: &str =
    "id, email, name, gift_aid, provider_customer_id, created_at, updated_at";

const DONATION_COLUMNS: &str = "id, donor_id, amount_minor, currency, frequency, gift_aid, \
     status, provider_session_id, provider_payment_id, provider_invoice_id, created_at";

const SUBSCRIPTION_COLUMNS: &str = "id, donor_id, provider_subscription_id, amount_minor, \
     currency, status, current_period_start, current_period_end, cancelled_at, created_at";

/// A completed payment to record.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub frequency: DonationFrequencyDb,
    pub gift_aid: bool,
    pub provider_session_id: Option<String>,
    pub provider_payment_id: Option<String>,
    pub provider_invoice_id: Option<String>,
}

/// A recurring donation to record.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub donor_id: Uuid,
    pub provider_subscription_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: SubscriptionStatusDb,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Repository for donor, donation and subscription database operations.
#[derive(Clone)]
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    /// Creates a new DonationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a donor by email.
    pub async fn find_donor_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DonorEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_donor_by_email");
        let sql = format!("SELECT {DONOR_COLUMNS} FROM donors WHERE email = $1");
        let result = sqlx::query_as::<_, DonorEntity>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Create the donor or fill in details missing on the existing row.
    ///
    /// Gift-aid eligibility is sticky: once declared it stays set.
    pub async fn upsert_donor(
        &self,
        email: &str,
        name: Option<&str>,
        gift_aid: bool,
        provider_customer_id: Option<&str>,
    ) -> Result<DonorEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_donor");
        let sql = format!(
            r#"
            INSERT INTO donors (email, name, gift_aid, provider_customer_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, donors.name),
                gift_aid = donors.gift_aid OR EXCLUDED.gift_aid,
                provider_customer_id = COALESCE(EXCLUDED.provider_customer_id, donors.provider_customer_id)
            RETURNING {DONOR_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, DonorEntity>(&sql)
            .bind(email)
            .bind(name)
            .bind(gift_aid)
            .bind(provider_customer_id)
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Record a completed donation. Returns None when a donation with the
    /// same provider reference already exists.
    pub async fn insert_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<Option<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_donation");
        let sql = format!(
            r#"
            INSERT INTO donations (donor_id, amount_minor, currency, frequency, gift_aid, status,
                provider_session_id, provider_payment_id, provider_invoice_id)
            VALUES ($1, $2, $3, $4, $5, 'completed', $6, $7, $8)
            ON CONFLICT DO NOTHING
            RETURNING {DONATION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, DonationEntity>(&sql)
            .bind(donation.donor_id)
            .bind(donation.amount_minor)
            .bind(&donation.currency)
            .bind(donation.frequency)
            .bind(donation.gift_aid)
            .bind(&donation.provider_session_id)
            .bind(&donation.provider_payment_id)
            .bind(&donation.provider_invoice_id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Record a recurring donation. Returns None on replay.
    pub async fn insert_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Option<DonationSubscriptionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_donation_subscription");
        let sql = format!(
            r#"
            INSERT INTO donation_subscriptions (donor_id, provider_subscription_id, amount_minor,
                currency, status, current_period_start, current_period_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider_subscription_id) DO NOTHING
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, DonationSubscriptionEntity>(&sql)
            .bind(subscription.donor_id)
            .bind(&subscription.provider_subscription_id)
            .bind(subscription.amount_minor)
            .bind(&subscription.currency)
            .bind(subscription.status)
            .bind(subscription.current_period_start)
            .bind(subscription.current_period_end)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Mark a recurring donation cancelled. The first cancellation time is kept.
    pub async fn cancel_subscription(
        &self,
        provider_subscription_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<DonationSubscriptionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("cancel_donation_subscription");
        let sql = format!(
            r#"
            UPDATE donation_subscriptions
            SET status = 'cancelled', cancelled_at = COALESCE(cancelled_at, $2)
            WHERE provider_subscription_id = $1
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, DonationSubscriptionEntity>(&sql)
            .bind(provider_subscription_id)
            .bind(ended_at)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a subscription by its payment-processor id.
    pub async fn find_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<DonationSubscriptionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_donation_subscription");
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM donation_subscriptions WHERE provider_subscription_id = $1"
        );
        let result = sqlx::query_as::<_, DonationSubscriptionEntity>(&sql)
            .bind(provider_subscription_id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Donations of a donor, newest first.
    pub async fn list_for_donor(
        &self,
        donor_id: Uuid,
    ) -> Result<Vec<DonationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_donations_for_donor");
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE donor_id = $1 ORDER BY created_at DESC"
        );
        let result = sqlx::query_as::<_, DonationEntity>(&sql)
            .bind(donor_id)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}

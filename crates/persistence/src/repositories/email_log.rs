//! Email log repository for database operations.
//!
//! A send is recorded as a `pending` row before the provider is called and
//! moved to `sent` or `failed` afterwards. For batch email types a partial
//! unique index on `(registration_id, email_type)` over live rows turns the
//! pending insert into an at-most-once claim.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EmailLogEntity, EmailTypeDb};
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, recipient, email_type, subject, status, provider_message_id, \
     error, registration_id, event_id, created_at, updated_at";

/// Who an email is for and what it is about.
#[derive(Debug, Clone)]
pub struct NewEmailLog {
    pub recipient: String,
    pub email_type: EmailTypeDb,
    pub subject: String,
    pub registration_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
}

/// Repository for email log database operations.
#[derive(Clone)]
pub struct EmailLogRepository {
    pool: PgPool,
}

impl EmailLogRepository {
    /// Creates a new EmailLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending row. Returns None when a live row for the same
    /// registration and batch type already exists.
    pub async fn claim(&self, log: &NewEmailLog) -> Result<Option<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("claim_email_log");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO email_logs (recipient, email_type, subject, status, registration_id, event_id)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&log.recipient)
        .bind(log.email_type)
        .bind(&log.subject)
        .bind(log.registration_id)
        .bind(log.event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Record a successful send.
    pub async fn mark_sent(
        &self,
        id: Uuid,
        provider_message_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("mark_email_sent");
        let result = sqlx::query(
            r#"
            UPDATE email_logs
            SET status = 'sent', provider_message_id = $2, error = NULL
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(provider_message_id)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|_| ())
    }

    /// Record a failed send, releasing any batch claim.
    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("mark_email_failed");
        let result = sqlx::query(
            r#"
            UPDATE email_logs
            SET status = 'failed', error = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|_| ())
    }

    /// Log rows for one registration, oldest first.
    pub async fn list_for_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Vec<EmailLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_email_logs_for_registration");
        let sql = format!(
            "SELECT {COLUMNS} FROM email_logs WHERE registration_id = $1 ORDER BY created_at ASC"
        );
        let result = sqlx::query_as::<_, EmailLogEntity>(&sql)
            .bind(registration_id)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}

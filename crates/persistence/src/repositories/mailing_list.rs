//! Mailing list repository for database operations.

use domain::models::mailing_list::{SubscribeAction, UnsubscribeAction};
use domain::models::MailingListStatus;
use sqlx::PgPool;

use crate::entities::{MailingListEntity, MailingListStatusDb};
use crate::metrics::QueryTimer;

const COLUMNS: &str =
    "id, email, name, status, source, subscribed_at, unsubscribed_at, created_at";

/// Repository for mailing list database operations.
///
/// Emails are expected lower-cased and trimmed by the caller.
#[derive(Clone)]
pub struct MailingListRepository {
    pool: PgPool,
}

impl MailingListRepository {
    /// Creates a new MailingListRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an entry by email.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<MailingListEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_mailing_list_by_email");
        let sql = format!("SELECT {COLUMNS} FROM mailing_list WHERE email = $1");
        let result = sqlx::query_as::<_, MailingListEntity>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Subscribe an address, reusing the existing row when there is one.
    pub async fn subscribe(
        &self,
        email: &str,
        name: Option<&str>,
        source: &str,
    ) -> Result<(MailingListEntity, SubscribeAction), sqlx::Error> {
        let timer = QueryTimer::new("subscribe_mailing_list");
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO mailing_list (email, name, source)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING {COLUMNS}
            "#
        );
        let inserted = sqlx::query_as::<_, MailingListEntity>(&sql)
            .bind(email)
            .bind(name)
            .bind(source)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(entry) = inserted {
            tx.commit().await?;
            timer.record();
            return Ok((entry, SubscribeAction::Insert));
        }

        let sql = format!("SELECT {COLUMNS} FROM mailing_list WHERE email = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, MailingListEntity>(&sql)
            .bind(email)
            .fetch_one(&mut *tx)
            .await?;

        let action = SubscribeAction::for_existing(Some(existing.status.into()));
        let entry = match action {
            SubscribeAction::Reactivate => {
                let sql = format!(
                    r#"
                    UPDATE mailing_list
                    SET status = 'active', unsubscribed_at = NULL, subscribed_at = NOW(),
                        name = COALESCE($2, name)
                    WHERE email = $1
                    RETURNING {COLUMNS}
                    "#
                );
                sqlx::query_as::<_, MailingListEntity>(&sql)
                    .bind(email)
                    .bind(name)
                    .fetch_one(&mut *tx)
                    .await?
            }
            SubscribeAction::Insert | SubscribeAction::AlreadyActive => existing,
        };

        tx.commit().await?;
        timer.record();
        Ok((entry, action))
    }

    /// Unsubscribe an address. Returns the action taken.
    pub async fn unsubscribe(&self, email: &str) -> Result<UnsubscribeAction, sqlx::Error> {
        let timer = QueryTimer::new("unsubscribe_mailing_list");
        let mut tx = self.pool.begin().await?;

        let status: Option<MailingListStatusDb> =
            sqlx::query_scalar("SELECT status FROM mailing_list WHERE email = $1 FOR UPDATE")
                .bind(email)
                .fetch_optional(&mut *tx)
                .await?;

        let action = UnsubscribeAction::for_existing(status.map(MailingListStatus::from));
        if action == UnsubscribeAction::Unsubscribe {
            sqlx::query(
                r#"
                UPDATE mailing_list
                SET status = 'unsubscribed', unsubscribed_at = NOW()
                WHERE email = $1
                "#,
            )
            .bind(email)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(action)
    }

    /// Hard-delete an entry. Returns true if a row was removed.
    pub async fn delete(&self, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_mailing_list");
        let result = sqlx::query("DELETE FROM mailing_list WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await;
        Ok(timer.finish(result)?.rows_affected() > 0)
    }

    /// List entries, newest subscription first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<MailingListStatusDb>,
    ) -> Result<Vec<MailingListEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_mailing_list");
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM mailing_list
            WHERE ($1::mailing_list_status IS NULL OR status = $1)
            ORDER BY subscribed_at DESC
            "#
        );
        let result = sqlx::query_as::<_, MailingListEntity>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}

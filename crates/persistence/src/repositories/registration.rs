//! Registration repository for database operations.
//!
//! Admission and cancellation run in a single transaction that locks the
//! event row first (`SELECT ... FOR UPDATE`), so concurrent writers for one
//! event are serialized and capacity checks see committed counts only.

use chrono::NaiveDate;
use domain::models::RegistrationStatus;
use domain::services::{
    decide_admission, next_in_line, plan_cancellation, AdmissionRefusal, CancellationRefusal,
    CapacitySnapshot, WaitlistCandidate,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    EventEntity, RegistrationChildEntity, RegistrationEntity, RegistrationStatusDb,
};
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, event_id, parent_name, parent_email, parent_phone, \
     notes, status, attended, attendance_confirmed, attendance_confirmed_at, \
     cancellation_reason, cancelled_at, created_at, updated_at";

const CHILD_COLUMNS: &str =
    "id, registration_id, name, age, attended, check_in_time, created_at";

const EVENT_COLUMNS: &str = "id, title, slug, description, event_date, start_time, end_time, \
     venue, category, total_slots, waitlist_slots, registration_status, status, \
     photo_album_url, reminder_enabled, created_at, updated_at";

/// Parent details for a new registration.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
}

/// One child of a new registration.
#[derive(Debug, Clone)]
pub struct NewChild {
    pub name: String,
    pub age: Option<i32>,
}

/// Result of an admission attempt.
#[derive(Debug)]
pub enum AdmissionOutcome {
    Admitted {
        event: EventEntity,
        registration: RegistrationEntity,
        children: Vec<RegistrationChildEntity>,
    },
    EventNotFound,
    /// Event exists but is not published.
    EventNotOpen,
    EventPassed,
    Refused(AdmissionRefusal),
}

/// Result of a cancellation attempt.
#[derive(Debug)]
pub enum CancellationOutcome {
    Cancelled {
        event: EventEntity,
        cancelled: RegistrationEntity,
        was_confirmed: bool,
        promoted: Option<RegistrationEntity>,
    },
    Refused(CancellationRefusal),
}

/// Repository for registration-related database operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admit a registration and its children, or refuse it.
    pub async fn create_atomic(
        &self,
        input: &NewRegistration,
        children: &[NewChild],
        today: NaiveDate,
    ) -> Result<AdmissionOutcome, sqlx::Error> {
        let timer = QueryTimer::new("create_registration_atomic");
        let mut tx = self.pool.begin().await?;

        let Some(event) = lock_event(&mut tx, input.event_id).await? else {
            return Ok(AdmissionOutcome::EventNotFound);
        };
        if event.status != crate::entities::EventStatusDb::Published {
            return Ok(AdmissionOutcome::EventNotOpen);
        }
        if event.event_date < today {
            return Ok(AdmissionOutcome::EventPassed);
        }

        let (confirmed, waitlisted): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'confirmed'),
                COUNT(*) FILTER (WHERE status = 'waitlisted')
            FROM registrations
            WHERE event_id = $1
            "#,
        )
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;

        let snapshot =
            CapacitySnapshot::new(event.total_slots, event.waitlist_slots, confirmed, waitlisted);
        let status = match decide_admission(event.registration_status.into(), &snapshot) {
            Ok(status) => status,
            Err(refusal) => return Ok(AdmissionOutcome::Refused(refusal)),
        };

        let sql = format!(
            r#"
            INSERT INTO registrations (event_id, parent_name, parent_email, parent_phone, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        );
        let registration = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event.id)
            .bind(&input.parent_name)
            .bind(&input.parent_email)
            .bind(&input.parent_phone)
            .bind(&input.notes)
            .bind(RegistrationStatusDb::from(status))
            .fetch_one(&mut *tx)
            .await?;

        let child_sql = format!(
            r#"
            INSERT INTO registration_children (registration_id, name, age)
            VALUES ($1, $2, $3)
            RETURNING {CHILD_COLUMNS}
            "#
        );
        let mut inserted = Vec::with_capacity(children.len());
        for child in children {
            let row = sqlx::query_as::<_, RegistrationChildEntity>(&child_sql)
                .bind(registration.id)
                .bind(&child.name)
                .bind(child.age)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        timer.record();

        Ok(AdmissionOutcome::Admitted {
            event,
            registration,
            children: inserted,
        })
    }

    /// Cancel a registration and, if it held a confirmed slot, promote the
    /// head of the waitlist. At most one registration is promoted.
    pub async fn cancel_with_promotion(
        &self,
        registration_id: Uuid,
        reason: Option<&str>,
        today: NaiveDate,
    ) -> Result<CancellationOutcome, sqlx::Error> {
        let timer = QueryTimer::new("cancel_registration_with_promotion");
        let mut tx = self.pool.begin().await?;

        let event_id: Option<Uuid> =
            sqlx::query_scalar("SELECT event_id FROM registrations WHERE id = $1")
                .bind(registration_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(event_id) = event_id else {
            return Ok(CancellationOutcome::Refused(CancellationRefusal::NotFound));
        };

        // Lock order: event, then registration.
        let Some(event) = lock_event(&mut tx, event_id).await? else {
            return Ok(CancellationOutcome::Refused(CancellationRefusal::NotFound));
        };

        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(registration_id)
            .fetch_optional(&mut *tx)
            .await?;

        let status = current.as_ref().map(|r| RegistrationStatus::from(r.status));
        let plan = match plan_cancellation(status, event.event_date, today) {
            Ok(plan) => plan,
            Err(refusal) => return Ok(CancellationOutcome::Refused(refusal)),
        };

        let sql = format!(
            r#"
            UPDATE registrations
            SET status = 'cancelled', cancellation_reason = $2, cancelled_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        );
        let cancelled = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(registration_id)
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        let mut promoted = None;
        if plan.promote {
            let waiting: Vec<(Uuid, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
                r#"
                SELECT id, created_at
                FROM registrations
                WHERE event_id = $1 AND status = 'waitlisted'
                "#,
            )
            .bind(event.id)
            .fetch_all(&mut *tx)
            .await?;

            let candidates: Vec<WaitlistCandidate> = waiting
                .into_iter()
                .map(|(id, created_at)| WaitlistCandidate { id, created_at })
                .collect();

            if let Some(next) = next_in_line(&candidates) {
                let sql = format!(
                    r#"
                    UPDATE registrations
                    SET status = 'confirmed'
                    WHERE id = $1 AND status = 'waitlisted'
                    RETURNING {REGISTRATION_COLUMNS}
                    "#
                );
                promoted = sqlx::query_as::<_, RegistrationEntity>(&sql)
                    .bind(next.id)
                    .fetch_optional(&mut *tx)
                    .await?;
                tracing::debug!(
                    event_id = %event.id,
                    cancelled_id = %registration_id,
                    promoted_id = %next.id,
                    "Promoting head of waitlist"
                );
            }
        }

        tx.commit().await?;
        timer.record();

        Ok(CancellationOutcome::Cancelled {
            event,
            cancelled,
            was_confirmed: plan.was_confirmed,
            promoted,
        })
    }

    /// Record a "yes" to the reconfirmation request. The first confirmation
    /// timestamp is kept. Returns None unless the registration is confirmed.
    pub async fn mark_attendance_confirmed(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_attendance_confirmed");
        let sql = format!(
            r#"
            UPDATE registrations
            SET attendance_confirmed = true,
                attendance_confirmed_at = COALESCE(attendance_confirmed_at, NOW())
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {REGISTRATION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Admin marking of the registration's day-of outcome.
    pub async fn set_attended(
        &self,
        id: Uuid,
        attended: Option<bool>,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_registration_attended");
        let sql = format!(
            "UPDATE registrations SET attended = $2 WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .bind(attended)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Check a child in (or out). `check_in_time` follows the flag.
    pub async fn set_child_attendance(
        &self,
        child_id: Uuid,
        attended: bool,
    ) -> Result<Option<RegistrationChildEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_child_attendance");
        let sql = format!(
            r#"
            UPDATE registration_children
            SET attended = $2,
                check_in_time = CASE WHEN $2 THEN NOW() ELSE NULL END
            WHERE id = $1
            RETURNING {CHILD_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, RegistrationChildEntity>(&sql)
            .bind(child_id)
            .bind(attended)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a registration by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1");
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a registration together with its event and children.
    pub async fn find_detail(
        &self,
        id: Uuid,
    ) -> Result<
        Option<(RegistrationEntity, EventEntity, Vec<RegistrationChildEntity>)>,
        sqlx::Error,
    > {
        let Some(registration) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let timer = QueryTimer::new("find_registration_event");
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(registration.event_id)
            .fetch_one(&self.pool)
            .await;
        let event = timer.finish(event)?;

        let mut children = self.children_for(&[registration.id]).await?;
        let children = children.remove(&registration.id).unwrap_or_default();
        Ok(Some((registration, event, children)))
    }

    /// Children of the given registrations, grouped by registration id.
    pub async fn children_for(
        &self,
        registration_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<RegistrationChildEntity>>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_children");
        let sql = format!(
            r#"
            SELECT {CHILD_COLUMNS}
            FROM registration_children
            WHERE registration_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#
        );
        let rows = sqlx::query_as::<_, RegistrationChildEntity>(&sql)
            .bind(registration_ids)
            .fetch_all(&self.pool)
            .await;
        let rows = timer.finish(rows)?;

        let mut grouped: HashMap<Uuid, Vec<RegistrationChildEntity>> = HashMap::new();
        for child in rows {
            grouped.entry(child.registration_id).or_default().push(child);
        }
        Ok(grouped)
    }

    /// All registrations of an event in admission order, including cancelled ones.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_registrations");
        let sql = format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Registrations of an event with the given status, in admission order.
    pub async fn list_for_event_with_status(
        &self,
        event_id: Uuid,
        status: RegistrationStatusDb,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_registrations_by_status");
        let sql = format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1 AND status = $2
            ORDER BY created_at ASC, id ASC
            "#
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Non-cancelled registrations that attended: marked `attended = true`
    /// or with at least one checked-in child.
    pub async fn list_attendees(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_event_attendees");
        let sql = format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations r
            WHERE r.event_id = $1
              AND r.status <> 'cancelled'
              AND (
                  r.attended = true
                  OR EXISTS (
                      SELECT 1 FROM registration_children c
                      WHERE c.registration_id = r.id AND c.attended = true
                  )
              )
            ORDER BY r.created_at ASC, r.id ASC
            "#
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }
}

async fn lock_event(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<EventEntity>, sqlx::Error> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, EventEntity>(&sql)
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
}

//! Event repository for database operations.

use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{EventCountsEntity, EventEntity, EventStatusDb, RegistrationModeDb};
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, title, slug, description, event_date, start_time, end_time, \
     venue, category, total_slots, waitlist_slots, registration_status, status, \
     photo_album_url, reminder_enabled, created_at, updated_at";

/// Column values for inserting or fully rewriting an event.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<chrono::NaiveTime>,
    pub end_time: Option<chrono::NaiveTime>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub total_slots: i32,
    pub waitlist_slots: i32,
    pub registration_status: RegistrationModeDb,
    pub status: EventStatusDb,
    pub photo_album_url: Option<String>,
    pub reminder_enabled: bool,
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event.
    pub async fn create(&self, input: &EventInput) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let sql = format!(
            r#"
            INSERT INTO events (title, slug, description, event_date, start_time, end_time,
                venue, category, total_slots, waitlist_slots, registration_status, status,
                photo_album_url, reminder_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.event_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.venue)
            .bind(&input.category)
            .bind(input.total_slots)
            .bind(input.waitlist_slots)
            .bind(input.registration_status)
            .bind(input.status)
            .bind(&input.photo_album_url)
            .bind(input.reminder_enabled)
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Rewrite every editable column of an event. Returns None when the id is unknown.
    pub async fn update(
        &self,
        id: Uuid,
        input: &EventInput,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_event");
        let sql = format!(
            r#"
            UPDATE events
            SET title = $2, slug = $3, description = $4, event_date = $5, start_time = $6,
                end_time = $7, venue = $8, category = $9, total_slots = $10,
                waitlist_slots = $11, registration_status = $12, status = $13,
                photo_album_url = $14, reminder_enabled = $15
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.event_date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.venue)
            .bind(&input.category)
            .bind(input.total_slots)
            .bind(input.waitlist_slots)
            .bind(input.registration_status)
            .bind(input.status)
            .bind(&input.photo_album_url)
            .bind(input.reminder_enabled)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Change the lifecycle status of an event.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: EventStatusDb,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_event_status");
        let sql = format!("UPDATE events SET status = $2 WHERE id = $1 RETURNING {EVENT_COLUMNS}");
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Find a published event by slug.
    pub async fn find_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_published_event_by_slug");
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1 AND status = 'published'"
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Published events taking place on or after `from`, soonest first.
    pub async fn list_upcoming_published(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_upcoming_published_events");
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published' AND event_date >= $1
            ORDER BY event_date ASC, start_time ASC NULLS FIRST
            "#
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(from)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Every event regardless of status, most recent first.
    pub async fn list_all(&self) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_events");
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date DESC, start_time DESC NULLS LAST"
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Published events on `date` with reminders enabled.
    pub async fn find_for_reminders(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_events_for_reminders");
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published' AND reminder_enabled = true AND event_date = $1
            "#
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Published events dated within `[from, to]`. Callers narrow to exact start instants.
    pub async fn find_published_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_published_events_between");
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published' AND event_date BETWEEN $1 AND $2
            "#
        );
        let result = sqlx::query_as::<_, EventEntity>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await;
        timer.finish(result)
    }

    /// Registration counts for a set of events, keyed by event id.
    ///
    /// Events without registrations are absent from the map.
    pub async fn counts_for(
        &self,
        event_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, EventCountsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("event_registration_counts");
        let rows = sqlx::query_as::<_, EventCountsEntity>(
            r#"
            SELECT
                r.event_id,
                COUNT(*) FILTER (WHERE r.status = 'confirmed') AS confirmed,
                COUNT(*) FILTER (WHERE r.status = 'waitlisted') AS waitlisted,
                COALESCE(SUM(
                    (SELECT COUNT(*) FROM registration_children c WHERE c.registration_id = r.id)
                ), 0)::BIGINT AS total_children
            FROM registrations r
            WHERE r.event_id = ANY($1) AND r.status <> 'cancelled'
            GROUP BY r.event_id
            "#,
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await;
        Ok(timer
            .finish(rows)?
            .into_iter()
            .map(|c| (c.event_id, c))
            .collect())
    }

    /// Registration counts for one event.
    pub async fn counts_for_event(&self, event_id: Uuid) -> Result<EventCountsEntity, sqlx::Error> {
        let mut counts = self.counts_for(&[event_id]).await?;
        Ok(counts.remove(&event_id).unwrap_or(EventCountsEntity {
            event_id,
            ..Default::default()
        }))
    }
}

//! Event entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain::models::{Event, EventStatus, RegistrationMode};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for registration_mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_mode", rename_all = "lowercase")]
pub enum RegistrationModeDb {
    Open,
    Closed,
    Auto,
}

impl From<RegistrationModeDb> for RegistrationMode {
    fn from(db: RegistrationModeDb) -> Self {
        match db {
            RegistrationModeDb::Open => RegistrationMode::Open,
            RegistrationModeDb::Closed => RegistrationMode::Closed,
            RegistrationModeDb::Auto => RegistrationMode::Auto,
        }
    }
}

impl From<RegistrationMode> for RegistrationModeDb {
    fn from(mode: RegistrationMode) -> Self {
        match mode {
            RegistrationMode::Open => RegistrationModeDb::Open,
            RegistrationMode::Closed => RegistrationModeDb::Closed,
            RegistrationMode::Auto => RegistrationModeDb::Auto,
        }
    }
}

/// Database enum for event_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Draft,
    Published,
    Cancelled,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Draft => EventStatus::Draft,
            EventStatusDb::Published => EventStatus::Published,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Draft => EventStatusDb::Draft,
            EventStatus::Published => EventStatusDb::Published,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub total_slots: i32,
    pub waitlist_slots: i32,
    pub registration_status: RegistrationModeDb,
    pub status: EventStatusDb,
    pub photo_album_url: Option<String>,
    pub reminder_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            slug: entity.slug,
            description: entity.description,
            event_date: entity.event_date,
            start_time: entity.start_time,
            end_time: entity.end_time,
            venue: entity.venue,
            category: entity.category,
            total_slots: entity.total_slots,
            waitlist_slots: entity.waitlist_slots,
            registration_status: entity.registration_status.into(),
            status: entity.status.into(),
            photo_album_url: entity.photo_album_url,
            reminder_enabled: entity.reminder_enabled,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Per-event registration counts, excluding cancelled registrations.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct EventCountsEntity {
    pub event_id: Uuid,
    pub confirmed: i64,
    pub waitlisted: i64,
    pub total_children: i64,
}

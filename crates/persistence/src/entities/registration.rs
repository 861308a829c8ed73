//! Registration and registration child entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Registration, RegistrationChild, RegistrationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for registration_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Waitlisted => RegistrationStatus::Waitlisted,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Waitlisted => RegistrationStatusDb::Waitlisted,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
    pub status: RegistrationStatusDb,
    pub attended: Option<bool>,
    pub attendance_confirmed: Option<bool>,
    pub attendance_confirmed_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            parent_name: entity.parent_name,
            parent_email: entity.parent_email,
            parent_phone: entity.parent_phone,
            notes: entity.notes,
            status: entity.status.into(),
            attended: entity.attended,
            attendance_confirmed: entity.attendance_confirmed,
            attendance_confirmed_at: entity.attendance_confirmed_at,
            cancellation_reason: entity.cancellation_reason,
            cancelled_at: entity.cancelled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the registration_children table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationChildEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub attended: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationChildEntity> for RegistrationChild {
    fn from(entity: RegistrationChildEntity) -> Self {
        Self {
            id: entity.id,
            registration_id: entity.registration_id,
            name: entity.name,
            age: entity.age,
            attended: entity.attended,
            check_in_time: entity.check_in_time,
            created_at: entity.created_at,
        }
    }
}

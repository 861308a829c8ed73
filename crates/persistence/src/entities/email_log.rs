//! Email log entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{EmailLog, EmailStatus, EmailType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for email_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "email_status", rename_all = "lowercase")]
pub enum EmailStatusDb {
    Pending,
    Sent,
    Failed,
}

impl From<EmailStatusDb> for EmailStatus {
    fn from(db: EmailStatusDb) -> Self {
        match db {
            EmailStatusDb::Pending => EmailStatus::Pending,
            EmailStatusDb::Sent => EmailStatus::Sent,
            EmailStatusDb::Failed => EmailStatus::Failed,
        }
    }
}

/// Database enum for email_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "email_type", rename_all = "snake_case")]
pub enum EmailTypeDb {
    RegistrationConfirmation,
    WaitlistConfirmation,
    WaitlistPromotion,
    CancellationConfirmation,
    EventReminder,
    AttendanceConfirmation,
    EventPhotos,
    WelcomeBack,
}

impl From<EmailTypeDb> for EmailType {
    fn from(db: EmailTypeDb) -> Self {
        match db {
            EmailTypeDb::RegistrationConfirmation => EmailType::RegistrationConfirmation,
            EmailTypeDb::WaitlistConfirmation => EmailType::WaitlistConfirmation,
            EmailTypeDb::WaitlistPromotion => EmailType::WaitlistPromotion,
            EmailTypeDb::CancellationConfirmation => EmailType::CancellationConfirmation,
            EmailTypeDb::EventReminder => EmailType::EventReminder,
            EmailTypeDb::AttendanceConfirmation => EmailType::AttendanceConfirmation,
            EmailTypeDb::EventPhotos => EmailType::EventPhotos,
            EmailTypeDb::WelcomeBack => EmailType::WelcomeBack,
        }
    }
}

impl From<EmailType> for EmailTypeDb {
    fn from(ty: EmailType) -> Self {
        match ty {
            EmailType::RegistrationConfirmation => EmailTypeDb::RegistrationConfirmation,
            EmailType::WaitlistConfirmation => EmailTypeDb::WaitlistConfirmation,
            EmailType::WaitlistPromotion => EmailTypeDb::WaitlistPromotion,
            EmailType::CancellationConfirmation => EmailTypeDb::CancellationConfirmation,
            EmailType::EventReminder => EmailTypeDb::EventReminder,
            EmailType::AttendanceConfirmation => EmailTypeDb::AttendanceConfirmation,
            EmailType::EventPhotos => EmailTypeDb::EventPhotos,
            EmailType::WelcomeBack => EmailTypeDb::WelcomeBack,
        }
    }
}

/// Database row mapping for the email_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailLogEntity {
    pub id: Uuid,
    pub recipient: String,
    pub email_type: EmailTypeDb,
    pub subject: String,
    pub status: EmailStatusDb,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub registration_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmailLogEntity> for EmailLog {
    fn from(entity: EmailLogEntity) -> Self {
        Self {
            id: entity.id,
            recipient: entity.recipient,
            email_type: entity.email_type.into(),
            subject: entity.subject,
            status: entity.status.into(),
            provider_message_id: entity.provider_message_id,
            error: entity.error,
            registration_id: entity.registration_id,
            event_id: entity.event_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

//! Mailing list entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{MailingListEntry, MailingListStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for mailing_list_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "mailing_list_status", rename_all = "lowercase")]
pub enum MailingListStatusDb {
    Active,
    Unsubscribed,
}

impl From<MailingListStatusDb> for MailingListStatus {
    fn from(db: MailingListStatusDb) -> Self {
        match db {
            MailingListStatusDb::Active => MailingListStatus::Active,
            MailingListStatusDb::Unsubscribed => MailingListStatus::Unsubscribed,
        }
    }
}

impl From<MailingListStatus> for MailingListStatusDb {
    fn from(status: MailingListStatus) -> Self {
        match status {
            MailingListStatus::Active => MailingListStatusDb::Active,
            MailingListStatus::Unsubscribed => MailingListStatusDb::Unsubscribed,
        }
    }
}

/// Database row mapping for the mailing_list table.
#[derive(Debug, Clone, FromRow)]
pub struct MailingListEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: MailingListStatusDb,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MailingListEntity> for MailingListEntry {
    fn from(entity: MailingListEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            status: entity.status.into(),
            source: entity.source,
            subscribed_at: entity.subscribed_at,
            unsubscribed_at: entity.unsubscribed_at,
            created_at: entity.created_at,
        }
    }
}

//! Outbound email audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Outcome of one send attempt. `Pending` doubles as the dedup claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "pending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of transactional email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    RegistrationConfirmation,
    WaitlistConfirmation,
    WaitlistPromotion,
    CancellationConfirmation,
    EventReminder,
    AttendanceConfirmation,
    EventPhotos,
    WelcomeBack,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::RegistrationConfirmation => "registration_confirmation",
            EmailType::WaitlistConfirmation => "waitlist_confirmation",
            EmailType::WaitlistPromotion => "waitlist_promotion",
            EmailType::CancellationConfirmation => "cancellation_confirmation",
            EmailType::EventReminder => "event_reminder",
            EmailType::AttendanceConfirmation => "attendance_confirmation",
            EmailType::EventPhotos => "event_photos",
            EmailType::WelcomeBack => "welcome_back",
        }
    }

    /// Batch types are sent at most once per registration.
    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            EmailType::EventReminder | EmailType::AttendanceConfirmation | EmailType::EventPhotos
        )
    }
}

impl FromStr for EmailType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration_confirmation" => Ok(EmailType::RegistrationConfirmation),
            "waitlist_confirmation" => Ok(EmailType::WaitlistConfirmation),
            "waitlist_promotion" => Ok(EmailType::WaitlistPromotion),
            "cancellation_confirmation" => Ok(EmailType::CancellationConfirmation),
            "event_reminder" => Ok(EmailType::EventReminder),
            "attendance_confirmation" => Ok(EmailType::AttendanceConfirmation),
            "event_photos" => Ok(EmailType::EventPhotos),
            "welcome_back" => Ok(EmailType::WelcomeBack),
            _ => Err(format!("Invalid email type: {}", s)),
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLog {
    pub id: Uuid,
    pub recipient: String,
    pub email_type: EmailType,
    pub subject: String,
    pub status: EmailStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub registration_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate result of a batch email trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSendResponse {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
}

impl BatchSendResponse {
    pub fn record_sent(&mut self) {
        self.sent += 1;
        self.total += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
        self.total += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
        self.total += 1;
    }

    pub fn merge(&mut self, other: BatchSendResponse) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.total += other.total;
    }
}

/// Body of the photo-sharing batch trigger.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPhotosRequest {
    pub event_id: Uuid,
}

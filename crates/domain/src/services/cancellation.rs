//! Cancellation and waitlist promotion planning.
//!
//! The persistence layer loads the locked rows and asks this module what to
//! do; the plan is then applied inside the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::registration::RegistrationStatus;

/// Reason stored when a registrant answers "no" to the reconfirmation email.
pub const CANNOT_ATTEND_REASON: &str = "cannot attend";

/// Why a cancellation (or attendance answer) was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancellationRefusal {
    #[error("Registration not found")]
    NotFound,

    #[error("Registration is already cancelled")]
    AlreadyCancelled,

    #[error("This event has already taken place")]
    EventPassed,

    /// Only a confirmed place can be reconfirmed; waitlisted families wait for promotion.
    #[error("Only confirmed places can be reconfirmed")]
    NotConfirmed,
}

impl CancellationRefusal {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationRefusal::NotFound => "not_found",
            CancellationRefusal::AlreadyCancelled => "already_cancelled",
            CancellationRefusal::EventPassed => "event_passed",
            CancellationRefusal::NotConfirmed => "not_confirmed",
        }
    }
}

/// What the cancellation must do once the refusals are ruled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPlan {
    pub was_confirmed: bool,
    /// Whether a freed slot should go to the head of the waitlist.
    pub promote: bool,
}

/// Checks the refusal conditions in order and plans the cancellation.
pub fn plan_cancellation(
    status: Option<RegistrationStatus>,
    event_date: NaiveDate,
    today: NaiveDate,
) -> Result<CancellationPlan, CancellationRefusal> {
    let status = status.ok_or(CancellationRefusal::NotFound)?;
    if status == RegistrationStatus::Cancelled {
        return Err(CancellationRefusal::AlreadyCancelled);
    }
    if event_date < today {
        return Err(CancellationRefusal::EventPassed);
    }

    let was_confirmed = status == RegistrationStatus::Confirmed;
    Ok(CancellationPlan {
        was_confirmed,
        promote: was_confirmed,
    })
}

/// A waitlisted registration eligible for promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitlistCandidate {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Head of the waitlist: earliest `created_at`, ties broken by id.
pub fn next_in_line(candidates: &[WaitlistCandidate]) -> Option<WaitlistCandidate> {
    candidates
        .iter()
        .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        .copied()
}

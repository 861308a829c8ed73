//! 72-hour attendance reconfirmation.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::registration::{AttendanceAnswer, RegistrationStatus};
use crate::services::cancellation::{plan_cancellation, CancellationRefusal};

/// Hours before the event start at which the window opens (inclusive).
pub const WINDOW_START_HOURS: i64 = 71;
/// Hours before the event start at which the window closes (inclusive).
pub const WINDOW_END_HOURS: i64 = 73;

/// The `[now + 71h, now + 73h]` range of event start instants to ask about.
pub fn reconfirmation_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now + Duration::hours(WINDOW_START_HOURS),
        now + Duration::hours(WINDOW_END_HOURS),
    )
}

pub fn in_reconfirmation_window(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let (from, to) = reconfirmation_window(now);
    starts_at >= from && starts_at <= to
}

/// Confirmed registrations that have not said yes yet get asked.
pub fn needs_reconfirmation(
    status: RegistrationStatus,
    attendance_confirmed: Option<bool>,
) -> bool {
    status == RegistrationStatus::Confirmed && attendance_confirmed != Some(true)
}

/// What answering the reconfirmation email does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendancePlan {
    /// Mark attending; keep the first confirmation timestamp.
    Confirm,
    /// Run the cancellation flow with
    /// [`CANNOT_ATTEND_REASON`](super::cancellation::CANNOT_ATTEND_REASON).
    Cancel,
}

/// Applies the same refusals as a cancellation to either answer. A "yes"
/// additionally requires a confirmed place.
pub fn plan_attendance_answer(
    answer: AttendanceAnswer,
    status: Option<RegistrationStatus>,
    event_date: NaiveDate,
    today: NaiveDate,
) -> Result<AttendancePlan, CancellationRefusal> {
    plan_cancellation(status, event_date, today)?;
    match answer {
        AttendanceAnswer::Yes if status != Some(RegistrationStatus::Confirmed) => {
            Err(CancellationRefusal::NotConfirmed)
        }
        AttendanceAnswer::Yes => Ok(AttendancePlan::Confirm),
        AttendanceAnswer::No => Ok(AttendancePlan::Cancel),
    }
}

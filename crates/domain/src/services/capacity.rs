//! Capacity evaluation for event registration.
//!
//! Capacity is counted in registrations: one family occupies one slot no
//! matter how many children it brings.

use serde::Serialize;
use thiserror::Error;

use crate::models::event::{CapacitySummary, RegistrationMode};
use crate::models::registration::RegistrationStatus;

/// Counts of non-cancelled registrations for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub total_slots: i64,
    pub waitlist_slots: i64,
    pub confirmed: i64,
    pub waitlisted: i64,
}

impl CapacitySnapshot {
    pub fn new(total_slots: i32, waitlist_slots: i32, confirmed: i64, waitlisted: i64) -> Self {
        Self {
            total_slots: i64::from(total_slots),
            waitlist_slots: i64::from(waitlist_slots),
            confirmed,
            waitlisted,
        }
    }

    pub fn spots_remaining(&self) -> i64 {
        self.total_slots - self.confirmed
    }

    pub fn waitlist_remaining(&self) -> i64 {
        self.waitlist_slots - self.waitlisted
    }

    /// Public summary, clamping negative remainders to zero.
    pub fn summary(&self, total_children: i64) -> CapacitySummary {
        CapacitySummary {
            confirmed: self.confirmed,
            waitlisted: self.waitlisted,
            spots_remaining: self.spots_remaining().max(0),
            waitlist_remaining: self.waitlist_remaining().max(0),
            total_children,
        }
    }
}

/// Why a registration attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionRefusal {
    #[error("Registration is closed for this event")]
    RegistrationClosed,

    #[error("This event is fully booked")]
    FullyBooked,
}

impl AdmissionRefusal {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionRefusal::RegistrationClosed => "registration_closed",
            AdmissionRefusal::FullyBooked => "fully_booked",
        }
    }
}

/// Decides the status of a new registration.
///
/// `closed` always refuses. `open` and `auto` both confirm while spots remain
/// and fall back to the waitlist while it has room. An `auto` event with no
/// spots and no waitlist room is fully booked, same as `open`.
pub fn decide_admission(
    mode: RegistrationMode,
    snapshot: &CapacitySnapshot,
) -> Result<RegistrationStatus, AdmissionRefusal> {
    if mode == RegistrationMode::Closed {
        return Err(AdmissionRefusal::RegistrationClosed);
    }

    if snapshot.spots_remaining() > 0 {
        Ok(RegistrationStatus::Confirmed)
    } else if snapshot.waitlist_remaining() > 0 {
        Ok(RegistrationStatus::Waitlisted)
    } else {
        Err(AdmissionRefusal::FullyBooked)
    }
}

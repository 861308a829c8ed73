//! Domain services for the community hub.
//!
//! Services hold the decision logic; persistence applies the outcome.

pub mod attendance;
pub mod cancellation;
pub mod capacity;
pub mod export;
pub mod mailer;

pub use attendance::{
    in_reconfirmation_window, needs_reconfirmation, plan_attendance_answer,
    reconfirmation_window, AttendancePlan,
};
pub use cancellation::{
    next_in_line, plan_cancellation, CancellationPlan, CancellationRefusal, WaitlistCandidate,
    CANNOT_ATTEND_REASON,
};
pub use capacity::{decide_admission, AdmissionRefusal, CapacitySnapshot};
pub use mailer::{EmailSender, MailerError, MockEmailSender, OutboundEmail, SendReceipt};

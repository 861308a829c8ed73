//! Domain models for the community hub.

pub mod donation;
pub mod email_log;
pub mod event;
pub mod mailing_list;
pub mod registration;
pub mod survey;

pub use donation::{Donation, DonationFrequency, DonationStatus, DonationSubscription, Donor};
pub use email_log::{BatchSendResponse, EmailLog, EmailStatus, EmailType};
pub use event::{CapacitySummary, Event, EventStatus, EventSummary, RegistrationMode};
pub use mailing_list::{MailingListEntry, MailingListStatus};
pub use registration::{
    AttendanceAnswer, Registration, RegistrationChild, RegistrationStatus,
    RegistrationWithChildren,
};
pub use survey::{QuestionKind, Survey, SurveyQuestion, SurveyResponse};

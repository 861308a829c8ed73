//! Repository implementations for database operations.

pub mod donation;
pub mod email_log;
pub mod event;
pub mod mailing_list;
pub mod registration;
pub mod survey;

pub use donation::{DonationRepository, NewDonation, NewSubscription};
pub use email_log::{EmailLogRepository, NewEmailLog};
pub use event::{EventInput, EventRepository};
pub use mailing_list::MailingListRepository;
pub use registration::{
    AdmissionOutcome, CancellationOutcome, NewChild, NewRegistration, RegistrationRepository,
};
pub use survey::SurveyRepository;

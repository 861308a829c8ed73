//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod donation;
pub mod email_log;
pub mod event;
pub mod mailing_list;
pub mod registration;
pub mod survey;

pub use donation::{
    DonationEntity, DonationFrequencyDb, DonationStatusDb, DonationSubscriptionEntity,
    DonorEntity, SubscriptionStatusDb,
};
pub use email_log::{EmailLogEntity, EmailStatusDb, EmailTypeDb};
pub use event::{EventCountsEntity, EventEntity, EventStatusDb, RegistrationModeDb};
pub use mailing_list::{MailingListEntity, MailingListStatusDb};
pub use registration::{RegistrationChildEntity, RegistrationEntity, RegistrationStatusDb};
pub use survey::{SurveyEntity, SurveyResponseEntity};

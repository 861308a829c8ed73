//! HTTP route handlers.

pub mod check_in;
pub mod donations;
pub mod email_batches;
pub mod events;
pub mod health;
pub mod mailing_list;
pub mod registrations;
pub mod surveys;

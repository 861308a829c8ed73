//! Domain layer for the community hub backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, Donation, MailingListEntry, Survey, EmailLog)
//! - Capacity, cancellation and attendance decision logic
//! - The outbound email abstraction

pub mod models;
pub mod services;

//! HTTP API for the community hub: events, registrations, mailing list,
//! donations, surveys and batch emails.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;

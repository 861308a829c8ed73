//! Batch emails: day-before reminders, three-day attendance reconfirmation
//! and post-event photo links.
//!
//! Each run is idempotent per (registration, email type) through the email
//! log claim, so the scheduler and the admin trigger can both fire safely.

use chrono::{DateTime, Days, NaiveDate, Utc};
use domain::models::{BatchSendResponse, Event, Registration};
use domain::services::{
    in_reconfirmation_window, needs_reconfirmation, reconfirmation_window, OutboundEmail,
};
use persistence::entities::RegistrationStatusDb;
use persistence::repositories::{EventRepository, RegistrationRepository};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::notifier::{DispatchOutcome, EmailContext, Notifier};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Event not found")]
    EventNotFound,

    #[error("Event has no photo album URL")]
    NoPhotoAlbum,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct BatchEmailer {
    events: EventRepository,
    registrations: RegistrationRepository,
    notifier: Notifier,
}

impl BatchEmailer {
    pub fn new(pool: PgPool, notifier: Notifier) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool),
            notifier,
        }
    }

    /// Remind confirmed registrants of published events happening tomorrow.
    pub async fn send_reminders(&self, today: NaiveDate) -> Result<BatchSendResponse, BatchError> {
        let Some(tomorrow) = today.checked_add_days(Days::new(1)) else {
            return Ok(BatchSendResponse::default());
        };
        let events = self.events.find_for_reminders(tomorrow).await?;

        let mut totals = BatchSendResponse::default();
        for event in events {
            let event: Event = event.into();
            let registrations = self
                .registrations
                .list_for_event_with_status(event.id, RegistrationStatusDb::Confirmed)
                .await?;

            let mut counts = BatchSendResponse::default();
            for registration in registrations {
                let registration: Registration = registration.into();
                let email = self.notifier.templates().event_reminder(&event, &registration);
                self.send(&email, &registration, &mut counts).await;
            }
            info!(
                event_id = %event.id,
                sent = counts.sent,
                skipped = counts.skipped,
                failed = counts.failed,
                "Reminders processed"
            );
            totals.merge(counts);
        }

        Ok(totals)
    }

    /// Ask confirmed registrants of events starting 71 to 73 hours from now
    /// whether they are still coming.
    pub async fn send_attendance_confirmations(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BatchSendResponse, BatchError> {
        let (from, to) = reconfirmation_window(now);
        let events = self
            .events
            .find_published_between(from.date_naive(), to.date_naive())
            .await?;

        let mut totals = BatchSendResponse::default();
        for event in events {
            let event: Event = event.into();
            if !in_reconfirmation_window(event.starts_at(), now) {
                continue;
            }

            let registrations = self
                .registrations
                .list_for_event_with_status(event.id, RegistrationStatusDb::Confirmed)
                .await?;

            let mut counts = BatchSendResponse::default();
            for registration in registrations {
                let registration: Registration = registration.into();
                if !needs_reconfirmation(registration.status, registration.attendance_confirmed) {
                    continue;
                }
                let email = self
                    .notifier
                    .templates()
                    .attendance_confirmation(&event, &registration);
                self.send(&email, &registration, &mut counts).await;
            }
            info!(
                event_id = %event.id,
                sent = counts.sent,
                skipped = counts.skipped,
                failed = counts.failed,
                "Attendance confirmations processed"
            );
            totals.merge(counts);
        }

        Ok(totals)
    }

    /// Send the photo album link to everyone recorded as attending.
    pub async fn send_photos(&self, event_id: Uuid) -> Result<BatchSendResponse, BatchError> {
        let event: Event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(BatchError::EventNotFound)?
            .into();
        if event.photo_album_url.is_none() {
            return Err(BatchError::NoPhotoAlbum);
        }

        let attendees = self.registrations.list_attendees(event_id).await?;
        let mut counts = BatchSendResponse::default();
        for registration in attendees {
            let registration: Registration = registration.into();
            let Some(email) = self.notifier.templates().event_photos(&event, &registration) else {
                continue;
            };
            self.send(&email, &registration, &mut counts).await;
        }

        info!(
            event_id = %event.id,
            sent = counts.sent,
            skipped = counts.skipped,
            failed = counts.failed,
            "Photo emails processed"
        );
        Ok(counts)
    }

    async fn send(
        &self,
        email: &OutboundEmail,
        registration: &Registration,
        counts: &mut BatchSendResponse,
    ) {
        let context = EmailContext::registration(registration.id, registration.event_id);
        match self.notifier.dispatch(email, context).await {
            Ok(DispatchOutcome::Sent) => counts.record_sent(),
            Ok(DispatchOutcome::Skipped) => counts.record_skipped(),
            Ok(DispatchOutcome::Failed) => counts.record_failed(),
            Err(e) => {
                warn!(registration_id = %registration.id, error = %e, "Email log write failed");
                counts.record_failed();
            }
        }
    }
}

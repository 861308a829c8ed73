//! Scheduled reminder and attendance reconfirmation emails.

use chrono::Utc;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::services::BatchEmailer;

/// Runs both time-based batches. Each is idempotent, so an hourly run only
/// sends to registrations that have not been emailed yet.
pub struct BatchEmailJob {
    emailer: BatchEmailer,
    interval_minutes: u64,
}

impl BatchEmailJob {
    pub fn new(emailer: BatchEmailer, interval_minutes: u64) -> Self {
        Self {
            emailer,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for BatchEmailJob {
    fn name(&self) -> &'static str {
        "batch_emails"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let reminders = self.emailer.send_reminders(now.date_naive()).await?;
        let attendance = self.emailer.send_attendance_confirmations(now).await?;
        info!(
            reminders_sent = reminders.sent,
            reminders_failed = reminders.failed,
            attendance_sent = attendance.sent,
            attendance_failed = attendance.failed,
            "Batch emails run"
        );
        Ok(())
    }
}

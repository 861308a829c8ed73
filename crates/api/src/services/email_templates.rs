//! Plain-text bodies for transactional emails.

use domain::models::{EmailType, Event, MailingListEntry, Registration};
use domain::services::OutboundEmail;

use crate::config::EmailConfig;

/// Renders [`OutboundEmail`]s with links back to the public site.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    base_url: String,
    org_name: String,
}

impl EmailTemplates {
    pub fn new(base_url: impl Into<String>, org_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            org_name: org_name.into(),
        }
    }

    pub fn from_config(config: &EmailConfig) -> Self {
        Self::new(&config.base_url, &config.sender_name)
    }

    fn cancel_link(&self, registration: &Registration) -> String {
        format!("{}/events/cancel?id={}", self.base_url, registration.id)
    }

    fn confirm_link(&self, registration: &Registration) -> String {
        format!(
            "{}/events/confirm-attendance?id={}",
            self.base_url, registration.id
        )
    }

    fn to_registrant(
        &self,
        registration: &Registration,
        email_type: EmailType,
        subject: String,
        body: String,
    ) -> OutboundEmail {
        OutboundEmail {
            to: registration.parent_email.clone(),
            to_name: Some(registration.parent_name.clone()),
            email_type,
            subject,
            body_text: format!(
                "Hi {},\n\n{}\n\nBest wishes,\n{}",
                registration.parent_name, body, self.org_name
            ),
            body_html: None,
        }
    }

    pub fn registration_confirmation(
        &self,
        event: &Event,
        registration: &Registration,
    ) -> OutboundEmail {
        let body = format!(
            "Your place at {title} is confirmed.\n\n{when}\n\n\
             If your plans change, please cancel so we can offer the place to someone else:\n{link}",
            title = event.title,
            when = describe_when(event),
            link = self.cancel_link(registration),
        );
        self.to_registrant(
            registration,
            EmailType::RegistrationConfirmation,
            format!("You're booked: {}", event.title),
            body,
        )
    }

    pub fn waitlist_confirmation(
        &self,
        event: &Event,
        registration: &Registration,
    ) -> OutboundEmail {
        let body = format!(
            "{title} is currently full, so we've added you to the waiting list.\n\n\
             We'll email you straight away if a place becomes free.\n\n{when}\n\n\
             To leave the waiting list:\n{link}",
            title = event.title,
            when = describe_when(event),
            link = self.cancel_link(registration),
        );
        self.to_registrant(
            registration,
            EmailType::WaitlistConfirmation,
            format!("You're on the waiting list: {}", event.title),
            body,
        )
    }

    pub fn waitlist_promotion(&self, event: &Event, registration: &Registration) -> OutboundEmail {
        let body = format!(
            "Good news! A place has opened up at {title} and it's yours.\n\n{when}\n\n\
             If you can no longer come, please cancel here:\n{link}",
            title = event.title,
            when = describe_when(event),
            link = self.cancel_link(registration),
        );
        self.to_registrant(
            registration,
            EmailType::WaitlistPromotion,
            format!("A place has opened up: {}", event.title),
            body,
        )
    }

    pub fn cancellation_confirmation(
        &self,
        event: &Event,
        registration: &Registration,
    ) -> OutboundEmail {
        let body = format!(
            "Your registration for {title} on {date} has been cancelled. \
             Thank you for letting us know.",
            title = event.title,
            date = event.event_date.format("%A %-d %B %Y"),
        );
        self.to_registrant(
            registration,
            EmailType::CancellationConfirmation,
            format!("Cancelled: {}", event.title),
            body,
        )
    }

    pub fn event_reminder(&self, event: &Event, registration: &Registration) -> OutboundEmail {
        let body = format!(
            "Just a reminder that {title} is tomorrow.\n\n{when}\n\n\
             Can't make it? Please cancel so a family on the waiting list can come:\n{link}",
            title = event.title,
            when = describe_when(event),
            link = self.cancel_link(registration),
        );
        self.to_registrant(
            registration,
            EmailType::EventReminder,
            format!("Reminder: {} is tomorrow", event.title),
            body,
        )
    }

    pub fn attendance_confirmation(
        &self,
        event: &Event,
        registration: &Registration,
    ) -> OutboundEmail {
        let body = format!(
            "{title} is in three days. Please let us know whether you're still coming:\n{link}\n\n\
             {when}",
            title = event.title,
            link = self.confirm_link(registration),
            when = describe_when(event),
        );
        self.to_registrant(
            registration,
            EmailType::AttendanceConfirmation,
            format!("Are you still coming to {}?", event.title),
            body,
        )
    }

    /// Returns None when the event has no album link.
    pub fn event_photos(
        &self,
        event: &Event,
        registration: &Registration,
    ) -> Option<OutboundEmail> {
        let album = event.photo_album_url.as_deref()?;
        let body = format!(
            "Thank you for coming to {title}! The photos are now online:\n{album}",
            title = event.title,
        );
        Some(self.to_registrant(
            registration,
            EmailType::EventPhotos,
            format!("Photos from {}", event.title),
            body,
        ))
    }

    pub fn welcome_back(&self, entry: &MailingListEntry) -> OutboundEmail {
        let greeting = entry
            .name
            .as_deref()
            .map(|name| format!("Hi {name},"))
            .unwrap_or_else(|| "Hello,".to_string());
        OutboundEmail {
            to: entry.email.clone(),
            to_name: entry.name.clone(),
            email_type: EmailType::WelcomeBack,
            subject: format!("Welcome back to {}", self.org_name),
            body_text: format!(
                "{greeting}\n\nYou're subscribed to our mailing list again. \
                 We'll keep you posted about upcoming events.\n\n\
                 Unsubscribe at any time: {}/unsubscribe\n\n{}",
                self.base_url, self.org_name
            ),
            body_html: None,
        }
    }
}

/// "Saturday 11 April 2026, 10:00-12:00 at Village Hall"
fn describe_when(event: &Event) -> String {
    let mut when = format!("When: {}", event.event_date.format("%A %-d %B %Y"));
    match (event.start_time, event.end_time) {
        (Some(start), Some(end)) => {
            when.push_str(&format!(", {}-{}", start.format("%H:%M"), end.format("%H:%M")))
        }
        (Some(start), None) => when.push_str(&format!(", from {}", start.format("%H:%M"))),
        _ => {}
    }
    if let Some(venue) = &event.venue {
        when.push_str(&format!("\nWhere: {venue}"));
    }
    when
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use domain::models::{EventStatus, RegistrationMode, RegistrationStatus};
    use uuid::Uuid;

    fn event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Spring Craft Morning".to_string(),
            slug: "spring-craft-morning".to_string(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2026, 4, 11).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            venue: Some("Village Hall".to_string()),
            category: None,
            total_slots: 10,
            waitlist_slots: 5,
            registration_status: RegistrationMode::Open,
            status: EventStatus::Published,
            photo_album_url: None,
            reminder_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn registration() -> Registration {
        Registration {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            parent_name: "Sam Carter".to_string(),
            parent_email: "sam@example.com".to_string(),
            parent_phone: None,
            notes: None,
            status: RegistrationStatus::Confirmed,
            attended: None,
            attendance_confirmed: None,
            attendance_confirmed_at: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn templates() -> EmailTemplates {
        EmailTemplates::new("https://hub.example.org/", "Community Hub")
    }

    #[test]
    fn test_describe_when() {
        let text = describe_when(&event());
        assert_eq!(
            text,
            "When: Saturday 11 April 2026, 10:00-12:00\nWhere: Village Hall"
        );
    }

    #[test]
    fn test_promotion_email_links_to_cancel_page() {
        let reg = registration();
        let email = templates().waitlist_promotion(&event(), &reg);
        assert_eq!(email.email_type, EmailType::WaitlistPromotion);
        assert_eq!(email.to, "sam@example.com");
        assert!(email
            .body_text
            .contains(&format!("https://hub.example.org/events/cancel?id={}", reg.id)));
        assert!(email.body_text.starts_with("Hi Sam Carter,"));
    }

    #[test]
    fn test_attendance_email_links_to_confirm_page() {
        let reg = registration();
        let email = templates().attendance_confirmation(&event(), &reg);
        assert!(email.body_text.contains(&format!(
            "https://hub.example.org/events/confirm-attendance?id={}",
            reg.id
        )));
    }

    #[test]
    fn test_photos_email_requires_album() {
        let mut event = event();
        assert!(templates().event_photos(&event, &registration()).is_none());

        event.photo_album_url = Some("https://photos.example.org/spring".to_string());
        let email = templates().event_photos(&event, &registration()).unwrap();
        assert!(email.body_text.contains("https://photos.example.org/spring"));
    }
}

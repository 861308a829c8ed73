//! Event domain models.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// How an event accepts new registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    /// Always accepts, overflowing into the waitlist when slots run out.
    Open,
    /// Rejects every new registration.
    Closed,
    /// Accepts while capacity (slots or waitlist) remains.
    Auto,
}

impl RegistrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationMode::Open => "open",
            RegistrationMode::Closed => "closed",
            RegistrationMode::Auto => "auto",
        }
    }
}

impl FromStr for RegistrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(RegistrationMode::Open),
            "closed" => Ok(RegistrationMode::Closed),
            "auto" => Ok(RegistrationMode::Auto),
            _ => Err(format!("Invalid registration mode: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A community event families can register for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub category: Option<String>,
    pub total_slots: i32,
    pub waitlist_slots: i32,
    pub registration_status: RegistrationMode,
    pub status: EventStatus,
    pub photo_album_url: Option<String>,
    pub reminder_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Start instant of the event. Times are stored as UTC wall-clock; a
    /// missing start time means midnight.
    pub fn starts_at(&self) -> DateTime<Utc> {
        event_start(self.event_date, self.start_time)
    }

    /// True once the event's date is strictly before `today`.
    pub fn has_passed(&self, today: NaiveDate) -> bool {
        self.event_date < today
    }

    pub fn is_published(&self) -> bool {
        self.status == EventStatus::Published
    }
}

/// Combines a date and optional time into a UTC instant.
pub fn event_start(date: NaiveDate, time: Option<NaiveTime>) -> DateTime<Utc> {
    let time = time.unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Short event info nested into registration payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: Option<String>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            slug: event.slug.clone(),
            event_date: event.event_date,
            start_time: event.start_time,
            end_time: event.end_time,
            venue: event.venue.clone(),
        }
    }
}

/// Occupancy figures for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySummary {
    pub confirmed: i64,
    pub waitlisted: i64,
    pub spots_remaining: i64,
    pub waitlist_remaining: i64,
    pub total_children: i64,
}

/// Event together with its current occupancy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithCapacity {
    #[serde(flatten)]
    pub event: Event,
    pub capacity: CapacitySummary,
}

/// Response for listing events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    pub data: Vec<EventWithCapacity>,
}

/// Request to create an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_event_times"))]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    /// Derived from the title when absent.
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(length(max = 200, message = "Venue must be at most 200 characters"))]
    pub venue: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 0, max = 10000, message = "totalSlots must be between 0 and 10000"))]
    pub total_slots: i32,

    #[validate(range(min = 0, max = 10000, message = "waitlistSlots must be between 0 and 10000"))]
    #[serde(default)]
    pub waitlist_slots: i32,

    #[serde(default = "default_registration_mode")]
    pub registration_status: RegistrationMode,

    #[serde(default = "default_event_status")]
    pub status: EventStatus,

    #[validate(url(message = "photoAlbumUrl must be a valid URL"))]
    pub photo_album_url: Option<String>,

    #[serde(default = "default_reminder_enabled")]
    pub reminder_enabled: bool,
}

fn default_registration_mode() -> RegistrationMode {
    RegistrationMode::Open
}

fn default_event_status() -> EventStatus {
    EventStatus::Draft
}

fn default_reminder_enabled() -> bool {
    true
}

fn validate_create_event_times(req: &CreateEventRequest) -> Result<(), ValidationError> {
    validate_time_order(req.start_time, req.end_time)
}

/// Partial update of an event; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(length(max = 200, message = "Venue must be at most 200 characters"))]
    pub venue: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 0, max = 10000, message = "totalSlots must be between 0 and 10000"))]
    pub total_slots: Option<i32>,

    #[validate(range(min = 0, max = 10000, message = "waitlistSlots must be between 0 and 10000"))]
    pub waitlist_slots: Option<i32>,

    pub registration_status: Option<RegistrationMode>,

    #[validate(url(message = "photoAlbumUrl must be a valid URL"))]
    pub photo_album_url: Option<String>,

    pub reminder_enabled: Option<bool>,
}

impl UpdateEventRequest {
    /// Applies the update to an existing event, returning the merged event.
    pub fn apply_to(&self, event: &Event) -> Result<Event, ValidationError> {
        let mut merged = event.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(date) = self.event_date {
            merged.event_date = date;
        }
        if let Some(start) = self.start_time {
            merged.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            merged.end_time = Some(end);
        }
        if let Some(venue) = &self.venue {
            merged.venue = Some(venue.clone());
        }
        if let Some(category) = &self.category {
            merged.category = Some(category.clone());
        }
        if let Some(total) = self.total_slots {
            merged.total_slots = total;
        }
        if let Some(waitlist) = self.waitlist_slots {
            merged.waitlist_slots = waitlist;
        }
        if let Some(mode) = self.registration_status {
            merged.registration_status = mode;
        }
        if let Some(url) = &self.photo_album_url {
            merged.photo_album_url = Some(url.clone());
        }
        if let Some(enabled) = self.reminder_enabled {
            merged.reminder_enabled = enabled;
        }
        validate_time_order(merged.start_time, merged.end_time)?;
        Ok(merged)
    }
}

/// Request to move an event through its lifecycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

fn validate_time_order(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            let mut err = ValidationError::new("time_order");
            err.message = Some("End time must be after start time".into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Spring Craft Morning".to_string(),
            slug: "spring-craft-morning".to_string(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2026, 4, 11).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            venue: Some("Village Hall".to_string()),
            category: Some("crafts".to_string()),
            total_slots: 20,
            waitlist_slots: 5,
            registration_status: RegistrationMode::Open,
            status: EventStatus::Published,
            photo_album_url: None,
            reminder_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_registration_mode_from_str() {
        assert_eq!(RegistrationMode::from_str("OPEN").unwrap(), RegistrationMode::Open);
        assert_eq!(RegistrationMode::from_str("auto").unwrap(), RegistrationMode::Auto);
        assert!(RegistrationMode::from_str("maybe").is_err());
    }

    #[test]
    fn test_event_status_serde() {
        let json = serde_json::to_string(&EventStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
        let parsed: EventStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, EventStatus::Cancelled);
    }

    #[test]
    fn test_starts_at_defaults_to_midnight() {
        let mut event = sample_event();
        event.start_time = None;
        assert_eq!(
            event.starts_at(),
            Utc.with_ymd_and_hms(2026, 4, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_starts_at_uses_start_time() {
        let event = sample_event();
        assert_eq!(
            event.starts_at(),
            Utc.with_ymd_and_hms(2026, 4, 11, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_has_passed() {
        let event = sample_event();
        assert!(!event.has_passed(NaiveDate::from_ymd_opt(2026, 4, 11).unwrap()));
        assert!(event.has_passed(NaiveDate::from_ymd_opt(2026, 4, 12).unwrap()));
        assert!(!event.has_passed(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
    }

    #[test]
    fn test_create_event_request_validation() {
        let json = serde_json::json!({
            "title": "Picnic",
            "eventDate": "2026-07-01",
            "startTime": "14:00:00",
            "endTime": "13:00:00",
            "totalSlots": 10
        });
        let req: CreateEventRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.registration_status, RegistrationMode::Open);
        assert_eq!(req.status, EventStatus::Draft);
        assert!(req.reminder_enabled);
        assert!(req.validate().is_err());

        let json = serde_json::json!({
            "title": "Picnic",
            "slug": "Bad Slug",
            "eventDate": "2026-07-01",
            "totalSlots": 10
        });
        let req: CreateEventRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());

        let json = serde_json::json!({
            "title": "Picnic",
            "eventDate": "2026-07-01",
            "totalSlots": -1
        });
        let req: CreateEventRequest = serde_json::from_value(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_event_apply() {
        let event = sample_event();
        let update = UpdateEventRequest {
            total_slots: Some(30),
            venue: Some("Park".to_string()),
            ..Default::default()
        };
        let merged = update.apply_to(&event).unwrap();
        assert_eq!(merged.total_slots, 30);
        assert_eq!(merged.venue.as_deref(), Some("Park"));
        assert_eq!(merged.title, event.title);
    }

    #[test]
    fn test_update_event_rejects_inverted_times() {
        let event = sample_event();
        let update = UpdateEventRequest {
            end_time: NaiveTime::from_hms_opt(9, 0, 0),
            ..Default::default()
        };
        assert!(update.apply_to(&event).is_err());
    }

    #[test]
    fn test_event_with_capacity_flattens() {
        let value = serde_json::to_value(EventWithCapacity {
            event: sample_event(),
            capacity: CapacitySummary::default(),
        })
        .unwrap();
        assert_eq!(value["slug"], "spring-craft-morning");
        assert_eq!(value["capacity"]["spotsRemaining"], 0);
        assert_eq!(value["registrationStatus"], "open");
    }
}

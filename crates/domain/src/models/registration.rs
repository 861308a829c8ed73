//! Registration domain models: family sign-ups, their children, and the
//! request/response payloads for intake, cancellation, attendance
//! reconfirmation and day-of check-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::event::EventSummary;

/// Place of a registration in the event's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlisted,
    /// Terminal: a cancelled registration never becomes active again.
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "waitlisted" => Ok(RegistrationStatus::Waitlisted),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            _ => Err(format!("Invalid registration status: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A family's sign-up for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
    pub status: RegistrationStatus,
    /// Day-of outcome: `Some(true)` attended, `Some(false)` no-show.
    pub attended: Option<bool>,
    /// Answer to the pre-event reconfirmation request.
    pub attendance_confirmed: Option<bool>,
    pub attendance_confirmed_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One child covered by a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationChild {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub attended: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A registration with its children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationWithChildren {
    #[serde(flatten)]
    pub registration: Registration,
    pub children: Vec<RegistrationChild>,
}

impl RegistrationWithChildren {
    /// True when the family or any of its children was checked in.
    pub fn has_attended(&self) -> bool {
        self.registration.attended == Some(true) || self.children.iter().any(|c| c.attended)
    }
}

/// Registration detail as shown on the cancel / confirm pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: Registration,
    pub event: EventSummary,
    pub children: Vec<RegistrationChild>,
}

/// Envelope for registration detail lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetailResponse {
    pub registration: RegistrationDetail,
}

/// Child entry on the registration form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChildInput {
    #[validate(length(min = 1, max = 100, message = "Child name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(min = 0, max = 18, message = "Child age must be between 0 and 18"))]
    pub age: Option<i32>,
}

/// Request to register a family for an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Parent name must be 1-100 characters"))]
    pub parent_name: String,

    #[validate(custom(function = "shared::validation::validate_email_shape"))]
    pub parent_email: String,

    #[validate(length(max = 30, message = "Phone number must be at most 30 characters"))]
    pub parent_phone: Option<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    #[validate(length(min = 1, max = 10, message = "Between 1 and 10 children are required"))]
    #[validate(nested)]
    pub children: Vec<ChildInput>,
}

/// Response after a registration attempt was admitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationResponse {
    pub success: bool,
    pub status: RegistrationStatus,
    pub registration: RegistrationWithChildren,
}

/// Request to cancel a registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelRegistrationRequest {
    pub registration_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Response after cancelling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRegistrationResponse {
    pub success: bool,
    pub was_confirmed: bool,
}

/// Query string `?id=` used by the public lookup pages.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationLookupQuery {
    pub id: Option<Uuid>,
}

/// Answer to the attendance reconfirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceAnswer {
    Yes,
    No,
}

impl AttendanceAnswer {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceAnswer::Yes => "yes",
            AttendanceAnswer::No => "no",
        }
    }
}

impl fmt::Display for AttendanceAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to answer the attendance reconfirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAttendanceRequest {
    pub registration_id: Option<Uuid>,
    pub attending: AttendanceAnswer,
}

/// Response after answering the reconfirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAttendanceResponse {
    pub success: bool,
    pub attending: AttendanceAnswer,
}

/// Check in (or un-check) one child.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub child_id: Uuid,
    pub attended: bool,
}

/// Check in several children at once.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckInRequest {
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 child ids are required"))]
    pub child_ids: Vec<Uuid>,
    pub attended: bool,
}

/// Outcome for one child of a bulk check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub child_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for single-child check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    pub child: RegistrationChild,
}

/// Response for bulk check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckInResponse {
    /// True only when every child was updated.
    pub success: bool,
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<CheckInResult>,
}

impl BulkCheckInResponse {
    pub fn from_results(results: Vec<CheckInResult>) -> Self {
        let updated = results.iter().filter(|r| r.success).count();
        let failed = results.len() - updated;
        Self {
            success: failed == 0,
            updated,
            failed,
            results,
        }
    }
}

/// Admin marking of a registration's day-of outcome.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttendedRequest {
    pub attended: Option<bool>,
}

/// Admin listing of an event's registrations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationsResponse {
    pub event: EventSummary,
    pub capacity: super::event::CapacitySummary,
    pub data: Vec<RegistrationWithChildren>,
}

/// Query for `GET /api/registrations/export`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRegistrationsQuery {
    pub event_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registration() -> Registration {
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

    fn child(registration_id: Uuid, attended: bool) -> RegistrationChild {
        RegistrationChild {
            id: Uuid::new_v4(),
            registration_id,
            name: "Alex".to_string(),
            age: Some(7),
            attended,
            check_in_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            RegistrationStatus::Confirmed,
            RegistrationStatus::Waitlisted,
            RegistrationStatus::Cancelled,
        ] {
            assert_eq!(RegistrationStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(!RegistrationStatus::Cancelled.is_active());
        assert!(RegistrationStatus::Waitlisted.is_active());
    }

    #[test]
    fn test_has_attended() {
        let registration = sample_registration();
        let id = registration.id;
        let mut with_children = RegistrationWithChildren {
            registration,
            children: vec![child(id, false), child(id, false)],
        };
        assert!(!with_children.has_attended());

        with_children.children[1].attended = true;
        assert!(with_children.has_attended());

        with_children.children[1].attended = false;
        with_children.registration.attended = Some(true);
        assert!(with_children.has_attended());
    }

    #[test]
    fn test_create_registration_request_validation() {
        let valid: CreateRegistrationRequest = serde_json::from_value(serde_json::json!({
            "eventId": Uuid::new_v4(),
            "parentName": "Sam",
            "parentEmail": "Sam@Example.com",
            "children": [{ "name": "Alex", "age": 6 }]
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let no_children: CreateRegistrationRequest = serde_json::from_value(serde_json::json!({
            "eventId": Uuid::new_v4(),
            "parentName": "Sam",
            "parentEmail": "sam@example.com",
            "children": []
        }))
        .unwrap();
        assert!(no_children.validate().is_err());

        let bad_email: CreateRegistrationRequest = serde_json::from_value(serde_json::json!({
            "eventId": Uuid::new_v4(),
            "parentName": "Sam",
            "parentEmail": "not-an-email",
            "children": [{ "name": "Alex" }]
        }))
        .unwrap();
        assert!(bad_email.validate().is_err());

        let bad_child: CreateRegistrationRequest = serde_json::from_value(serde_json::json!({
            "eventId": Uuid::new_v4(),
            "parentName": "Sam",
            "parentEmail": "sam@example.com",
            "children": [{ "name": "" }]
        }))
        .unwrap();
        assert!(bad_child.validate().is_err());
    }

    #[test]
    fn test_confirm_attendance_request_parsing() {
        let req: ConfirmAttendanceRequest = serde_json::from_value(serde_json::json!({
            "registrationId": Uuid::new_v4(),
            "attending": "no"
        }))
        .unwrap();
        assert_eq!(req.attending, AttendanceAnswer::No);

        let bad = serde_json::from_value::<ConfirmAttendanceRequest>(serde_json::json!({
            "registrationId": Uuid::new_v4(),
            "attending": "maybe"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_bulk_check_in_response_counts() {
        let ok = CheckInResult {
            child_id: Uuid::new_v4(),
            success: true,
            error: None,
        };
        let failed = CheckInResult {
            child_id: Uuid::new_v4(),
            success: false,
            error: Some("Child not found".to_string()),
        };

        let response = BulkCheckInResponse::from_results(vec![ok.clone(), failed]);
        assert!(!response.success);
        assert_eq!(response.updated, 1);
        assert_eq!(response.failed, 1);

        let response = BulkCheckInResponse::from_results(vec![ok]);
        assert!(response.success);
    }

    #[test]
    fn test_registration_serializes_camel_case() {
        let value = serde_json::to_value(sample_registration()).unwrap();
        assert_eq!(value["status"], "confirmed");
        assert!(value.get("parentEmail").is_some());
        assert!(value.get("attendanceConfirmed").is_some());
    }
}

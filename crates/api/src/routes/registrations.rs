//! Registration intake, cancellation and attendance reconfirmation routes.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use domain::models::registration::{
    CancelRegistrationRequest, CancelRegistrationResponse, ConfirmAttendanceRequest,
    ConfirmAttendanceResponse, CreateRegistrationRequest, CreateRegistrationResponse,
    ExportRegistrationsQuery, RegistrationDetail, RegistrationDetailResponse,
    RegistrationLookupQuery,
};
use domain::models::{
    Event, EventSummary, Registration, RegistrationChild, RegistrationStatus,
    RegistrationWithChildren,
};
use domain::services::{
    export, plan_attendance_answer, AttendancePlan, CancellationRefusal, CANNOT_ATTEND_REASON,
};
use persistence::entities::RegistrationEntity;
use persistence::repositories::{
    AdmissionOutcome, CancellationOutcome, EventRepository, NewChild, NewRegistration,
    RegistrationRepository,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppQuery};
use crate::middleware::metrics::{record_cancellation, record_registration};
use crate::services::EmailContext;

/// Attach children to each registration, keeping the input order.
pub(crate) async fn with_children(
    repo: &RegistrationRepository,
    registrations: Vec<RegistrationEntity>,
) -> Result<Vec<RegistrationWithChildren>, sqlx::Error> {
    let ids: Vec<Uuid> = registrations.iter().map(|r| r.id).collect();
    let mut children = repo.children_for(&ids).await?;

    Ok(registrations
        .into_iter()
        .map(|entity| {
            let kids = children
                .remove(&entity.id)
                .unwrap_or_default()
                .into_iter()
                .map(RegistrationChild::from)
                .collect();
            RegistrationWithChildren {
                registration: entity.into(),
                children: kids,
            }
        })
        .collect())
}

fn require_id(id: Option<Uuid>) -> Result<Uuid, ApiError> {
    id.ok_or_else(|| ApiError::Validation("Registration ID is required".to_string()))
}

/// Register children for an event.
///
/// POST /api/registrations
///
/// Confirms, waitlists or refuses according to the event's capacity and
/// registration mode. The registrant is emailed on success.
pub async fn create_registration(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<CreateRegistrationResponse>), ApiError> {
    request.validate()?;

    let registration = NewRegistration {
        event_id: request.event_id,
        parent_name: request.parent_name.trim().to_string(),
        parent_email: shared::validation::normalize_email(&request.parent_email),
        parent_phone: request.parent_phone,
        notes: request.notes,
    };
    let children: Vec<NewChild> = request
        .children
        .into_iter()
        .map(|c| NewChild {
            name: c.name.trim().to_string(),
            age: c.age,
        })
        .collect();

    let repo = RegistrationRepository::new(state.pool.clone());
    let today = Utc::now().date_naive();

    let (event, registration, children) = match repo
        .create_atomic(&registration, &children, today)
        .await?
    {
        AdmissionOutcome::Admitted {
            event,
            registration,
            children,
        } => (event, registration, children),
        AdmissionOutcome::EventNotFound => {
            return Err(ApiError::NotFound("Event not found".to_string()))
        }
        AdmissionOutcome::EventNotOpen => {
            return Err(ApiError::Validation(
                "Event is not open for registration".to_string(),
            ))
        }
        AdmissionOutcome::EventPassed => {
            return Err(ApiError::Conflict {
                code: "event_passed",
                message: "This event has already taken place".to_string(),
            })
        }
        AdmissionOutcome::Refused(refusal) => {
            record_registration(refusal.as_str());
            info!(event_id = %request.event_id, reason = refusal.as_str(), "Registration refused");
            return Err(refusal.into());
        }
    };

    let event: Event = event.into();
    let registration: Registration = registration.into();
    let status = registration.status;
    record_registration(status.as_str());

    info!(
        registration_id = %registration.id,
        event_id = %event.id,
        status = %status,
        children = children.len(),
        "Registration created"
    );

    let templates = state.notifier.templates();
    let email = match status {
        RegistrationStatus::Waitlisted => templates.waitlist_confirmation(&event, &registration),
        _ => templates.registration_confirmation(&event, &registration),
    };
    state
        .notifier
        .dispatch_best_effort(&email, EmailContext::registration(registration.id, event.id))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(CreateRegistrationResponse {
            success: true,
            status,
            registration: RegistrationWithChildren {
                registration,
                children: children.into_iter().map(RegistrationChild::from).collect(),
            },
        }),
    ))
}

/// Cancel a registration, promote the next waitlisted family when a
/// confirmed place was freed, and email both parties.
async fn cancel_and_notify(
    state: &AppState,
    id: Uuid,
    reason: Option<&str>,
) -> Result<bool, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let today = Utc::now().date_naive();

    let (event, cancelled, was_confirmed, promoted) =
        match repo.cancel_with_promotion(id, reason, today).await? {
            CancellationOutcome::Cancelled {
                event,
                cancelled,
                was_confirmed,
                promoted,
            } => (event, cancelled, was_confirmed, promoted),
            CancellationOutcome::Refused(refusal) => return Err(refusal.into()),
        };

    let event: Event = event.into();
    let cancelled: Registration = cancelled.into();
    let promoted: Option<Registration> = promoted.map(Registration::from);
    record_cancellation(was_confirmed, promoted.is_some());

    info!(
        registration_id = %cancelled.id,
        event_id = %event.id,
        was_confirmed,
        promoted_id = ?promoted.as_ref().map(|p| p.id),
        "Registration cancelled"
    );

    let templates = state.notifier.templates();
    state
        .notifier
        .dispatch_best_effort(
            &templates.cancellation_confirmation(&event, &cancelled),
            EmailContext::registration(cancelled.id, event.id),
        )
        .await;

    if let Some(promoted) = &promoted {
        state
            .notifier
            .dispatch_best_effort(
                &templates.waitlist_promotion(&event, promoted),
                EmailContext::registration(promoted.id, event.id),
            )
            .await;
    }

    Ok(was_confirmed)
}

async fn load_detail(state: &AppState, id: Uuid) -> Result<RegistrationDetail, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let (registration, event, children) = repo
        .find_detail(id)
        .await?
        .ok_or(CancellationRefusal::NotFound)?;

    let event: Event = event.into();
    Ok(RegistrationDetail {
        registration: registration.into(),
        event: EventSummary::from(&event),
        children: children.into_iter().map(RegistrationChild::from).collect(),
    })
}

/// Registration shown on the cancellation page.
///
/// GET /api/registrations/cancel?id=
pub async fn get_for_cancel(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RegistrationLookupQuery>,
) -> Result<Json<RegistrationDetailResponse>, ApiError> {
    let id = require_id(query.id)?;
    Ok(Json(RegistrationDetailResponse {
        registration: load_detail(&state, id).await?,
    }))
}

/// POST /api/registrations/cancel
pub async fn cancel_registration(
    State(state): State<AppState>,
    AppJson(request): AppJson<CancelRegistrationRequest>,
) -> Result<Json<CancelRegistrationResponse>, ApiError> {
    request.validate()?;
    let id = require_id(request.registration_id)?;
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let was_confirmed = cancel_and_notify(&state, id, reason).await?;
    Ok(Json(CancelRegistrationResponse {
        success: true,
        was_confirmed,
    }))
}

/// Registration shown on the attendance reconfirmation page.
///
/// GET /api/registrations/confirm-attendance?id=
pub async fn get_for_confirm(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RegistrationLookupQuery>,
) -> Result<Json<RegistrationDetailResponse>, ApiError> {
    let id = require_id(query.id)?;
    Ok(Json(RegistrationDetailResponse {
        registration: load_detail(&state, id).await?,
    }))
}

/// Answer the reconfirmation email. "no" cancels the registration.
///
/// POST /api/registrations/confirm-attendance
pub async fn confirm_attendance(
    State(state): State<AppState>,
    AppJson(request): AppJson<ConfirmAttendanceRequest>,
) -> Result<Json<ConfirmAttendanceResponse>, ApiError> {
    let id = require_id(request.registration_id)?;
    let repo = RegistrationRepository::new(state.pool.clone());

    let (registration, event, _) = repo
        .find_detail(id)
        .await?
        .ok_or(CancellationRefusal::NotFound)?;
    let status = RegistrationStatus::from(registration.status);

    let today = Utc::now().date_naive();
    match plan_attendance_answer(request.attending, Some(status), event.event_date, today)? {
        AttendancePlan::Confirm => {
            repo.mark_attendance_confirmed(id)
                .await?
                .ok_or(CancellationRefusal::AlreadyCancelled)?;
            info!(registration_id = %id, "Attendance confirmed");
        }
        AttendancePlan::Cancel => {
            cancel_and_notify(&state, id, Some(CANNOT_ATTEND_REASON)).await?;
        }
    }

    Ok(Json(ConfirmAttendanceResponse {
        success: true,
        attending: request.attending,
    }))
}

/// Download an event's registrations as CSV, one row per child.
///
/// GET /api/registrations/export?eventId=
pub async fn export_registrations(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ExportRegistrationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = query
        .event_id
        .ok_or_else(|| ApiError::Validation("Event ID is required".to_string()))?;

    let event: Event = EventRepository::new(state.pool.clone())
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    let repo = RegistrationRepository::new(state.pool.clone());
    let rows = repo.list_for_event(event_id).await?;
    let registrations = with_children(&repo, rows).await?;

    let csv = export::registrations_csv(&registrations);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::export_filename(&event.title)
    );

    info!(event_id = %event.id, registrations = registrations.len(), "Registrations exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        let id = Uuid::new_v4();
        assert_eq!(require_id(Some(id)).unwrap(), id);
        assert!(matches!(require_id(None), Err(ApiError::Validation(_))));
    }
}

//! Day-of check-in routes.

use axum::{
    extract::State,
    Json,
};
use domain::models::registration::{
    BulkCheckInRequest, BulkCheckInResponse, CheckInRequest, CheckInResponse, CheckInResult,
    SetAttendedRequest,
};
use domain::models::Registration;
use persistence::repositories::RegistrationRepository;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath};

/// Check one child in or out.
///
/// POST /api/admin/check-in
pub async fn check_in(
    State(state): State<AppState>,
    AppJson(request): AppJson<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let child = repo
        .set_child_attendance(request.child_id, request.attended)
        .await?
        .ok_or_else(|| ApiError::NotFound("Child not found".to_string()))?;

    info!(child_id = %child.id, attended = child.attended, "Child check-in updated");
    Ok(Json(CheckInResponse {
        success: true,
        child: child.into(),
    }))
}

/// Check several children in or out. Continues past failures and reports
/// a result per id.
///
/// POST /api/admin/check-in/bulk
pub async fn bulk_check_in(
    State(state): State<AppState>,
    AppJson(request): AppJson<BulkCheckInRequest>,
) -> Result<Json<BulkCheckInResponse>, ApiError> {
    request.validate()?;
    let repo = RegistrationRepository::new(state.pool.clone());

    let mut results = Vec::with_capacity(request.child_ids.len());
    for child_id in request.child_ids {
        let result = match repo.set_child_attendance(child_id, request.attended).await {
            Ok(Some(_)) => CheckInResult {
                child_id,
                success: true,
                error: None,
            },
            Ok(None) => CheckInResult {
                child_id,
                success: false,
                error: Some("Child not found".to_string()),
            },
            Err(e) => {
                warn!(child_id = %child_id, error = %e, "Check-in update failed");
                CheckInResult {
                    child_id,
                    success: false,
                    error: Some("Update failed".to_string()),
                }
            }
        };
        results.push(result);
    }

    let response = BulkCheckInResponse::from_results(results);
    info!(
        updated = response.updated,
        failed = response.failed,
        attended = request.attended,
        "Bulk check-in processed"
    );
    Ok(Json(response))
}

/// Record whether the family turned up. `null` clears the mark.
///
/// POST /api/admin/registrations/:id/attended
pub async fn set_attended(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<SetAttendedRequest>,
) -> Result<Json<Registration>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let registration: Registration = repo
        .set_attended(id, request.attended)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?
        .into();

    info!(
        registration_id = %id,
        attended = ?registration.attended,
        "Registration attendance marked"
    );
    Ok(Json(registration))
}

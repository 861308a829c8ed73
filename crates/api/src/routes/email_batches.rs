//! Admin triggers for batch emails.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::email_log::{BatchSendResponse, SendPhotosRequest};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AppJson;

/// Day-before reminders for tomorrow's events.
///
/// GET|POST /api/email/send-reminders
pub async fn send_reminders(
    State(state): State<AppState>,
) -> Result<Json<BatchSendResponse>, ApiError> {
    let result = state
        .batch_emailer()
        .send_reminders(Utc::now().date_naive())
        .await?;
    info!(
        sent = result.sent,
        failed = result.failed,
        skipped = result.skipped,
        "Reminder batch triggered"
    );
    Ok(Json(result))
}

/// Attendance reconfirmation for events starting in about three days.
///
/// GET|POST /api/email/send-attendance-confirmation
pub async fn send_attendance_confirmations(
    State(state): State<AppState>,
) -> Result<Json<BatchSendResponse>, ApiError> {
    let result = state
        .batch_emailer()
        .send_attendance_confirmations(Utc::now())
        .await?;
    info!(
        sent = result.sent,
        failed = result.failed,
        skipped = result.skipped,
        "Attendance batch triggered"
    );
    Ok(Json(result))
}

/// POST /api/email/send-photos
pub async fn send_photos(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendPhotosRequest>,
) -> Result<Json<BatchSendResponse>, ApiError> {
    let result = state.batch_emailer().send_photos(request.event_id).await?;
    info!(
        event_id = %request.event_id,
        sent = result.sent,
        failed = result.failed,
        "Photo batch triggered"
    );
    Ok(Json(result))
}

//! Donation checkout and payment webhook routes.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use domain::models::donation::{CreateCheckoutRequest, CreateCheckoutResponse, WebhookAck};
use tracing::warn;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::services::payments::{CheckoutParams, SIGNATURE_HEADER};

/// Open a hosted checkout page for a one-off or monthly donation.
///
/// POST /api/donations/create-checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    request.validate()?;

    let amount_minor = shared::validation::to_minor_units(request.amount)
        .ok_or_else(|| {
            ApiError::Validation(
                "Amount must be a positive number with at most two decimal places".to_string(),
            )
        })?;

    let params = CheckoutParams {
        amount_minor,
        frequency: request.frequency,
        gift_aid: request.gift_aid,
        donor_email: request
            .donor_email
            .as_deref()
            .map(shared::validation::normalize_email)
            .filter(|e| !e.is_empty()),
        donor_name: request
            .donor_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    };

    let session = state.payments.create_checkout_session(&params).await?;
    Ok(Json(session))
}

/// Receive a signed event from the payment processor.
///
/// POST /api/donations/webhook
///
/// The signature covers the raw body, so it is taken as bytes.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let now = Utc::now();

    let event = state
        .payments
        .verify_webhook(&body, signature, now)
        .inspect_err(|e| warn!(error = %e, "Rejected payment webhook"))?;

    state.donations.process(&event, now).await?;
    Ok(Json(WebhookAck { received: true }))
}

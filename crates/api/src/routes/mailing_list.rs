//! Mailing list subscription routes.

use axum::{
    extract::State,
    Json,
};
use domain::models::mailing_list::{
    AddSubscriberRequest, DeleteSubscriberRequest, ListSubscribersQuery,
    ListSubscribersResponse, MessageResponse, SubscribeAction, SubscribeRequest,
    UnsubscribeAction, UnsubscribeRequest,
};
use domain::models::MailingListEntry;
use persistence::repositories::MailingListRepository;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppQuery};
use crate::services::EmailContext;

const DEFAULT_SOURCE: &str = "website";
const ADMIN_SOURCE: &str = "admin";

/// Lower-cased, trimmed address, or a validation error.
fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = shared::validation::normalize_email(raw);
    if shared::validation::is_valid_email(&email) {
        Ok(email)
    } else {
        Err(ApiError::Validation(
            "Please provide a valid email address".to_string(),
        ))
    }
}

fn clean_name(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

/// POST /api/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    AppJson(request): AppJson<SubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let email = checked_email(&request.email)?;
    let source = request
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SOURCE);

    let repo = MailingListRepository::new(state.pool.clone());
    let (entry, action) = repo
        .subscribe(&email, clean_name(request.name.as_deref()), source)
        .await?;

    info!(email = %email, action = ?action, source, "Mailing list subscribe");

    if action == SubscribeAction::Reactivate {
        let entry = MailingListEntry::from(entry);
        let welcome = state.notifier.templates().welcome_back(&entry);
        state
            .notifier
            .dispatch_best_effort(&welcome, EmailContext::default())
            .await;
    }

    Ok(Json(MessageResponse::ok(action.message())))
}

/// POST /api/unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    AppJson(request): AppJson<UnsubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = checked_email(&request.email)?;
    let repo = MailingListRepository::new(state.pool.clone());

    let action = repo.unsubscribe(&email).await?;
    info!(email = %email, action = ?action, "Mailing list unsubscribe");

    match action {
        UnsubscribeAction::NotFound => Err(ApiError::NotFound(action.message().to_string())),
        _ => Ok(Json(MessageResponse::ok(action.message()))),
    }
}

/// Subscribe on someone's behalf. No welcome email is sent.
///
/// POST /api/subscribers/add
pub async fn add_subscriber(
    State(state): State<AppState>,
    AppJson(request): AppJson<AddSubscriberRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    let email = checked_email(&request.email)?;

    let repo = MailingListRepository::new(state.pool.clone());
    let (_, action) = repo
        .subscribe(&email, clean_name(request.name.as_deref()), ADMIN_SOURCE)
        .await?;

    info!(email = %email, action = ?action, "Subscriber added by admin");
    Ok(Json(MessageResponse::ok(action.message())))
}

/// Remove the address entirely.
///
/// POST /api/subscribers/delete
pub async fn delete_subscriber(
    State(state): State<AppState>,
    AppJson(request): AppJson<DeleteSubscriberRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = shared::validation::normalize_email(&request.email);
    let repo = MailingListRepository::new(state.pool.clone());

    if !repo.delete(&email).await? {
        return Err(ApiError::NotFound("Email address not found".to_string()));
    }

    info!(email = %email, "Subscriber deleted");
    Ok(Json(MessageResponse::ok("Subscriber deleted")))
}

/// GET /api/subscribers?status=
pub async fn list_subscribers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListSubscribersQuery>,
) -> Result<Json<ListSubscribersResponse>, ApiError> {
    let repo = MailingListRepository::new(state.pool.clone());
    let data: Vec<MailingListEntry> = repo
        .list(query.status.map(Into::into))
        .await?
        .into_iter()
        .map(MailingListEntry::from)
        .collect();

    Ok(Json(ListSubscribersResponse {
        total: data.len(),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_email_normalizes() {
        assert_eq!(
            checked_email("  Parent@Example.ORG ").unwrap(),
            "parent@example.org"
        );
    }

    #[test]
    fn test_checked_email_rejects_bad_shape() {
        assert!(matches!(
            checked_email("no-at-sign.example.org"),
            Err(ApiError::Validation(_))
        ));
        assert!(checked_email("a@b").is_err());
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name(Some("  Sam ")), Some("Sam"));
        assert_eq!(clean_name(Some("   ")), None);
        assert_eq!(clean_name(None), None);
    }
}

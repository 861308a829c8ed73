//! Event listing and administration routes.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::event::{
    CreateEventRequest, EventWithCapacity, ListEventsResponse, UpdateEventRequest,
    UpdateEventStatusRequest,
};
use domain::models::registration::EventRegistrationsResponse;
use domain::models::{CapacitySummary, Event, EventSummary};
use domain::services::CapacitySnapshot;
use persistence::entities::{EventCountsEntity, EventEntity};
use persistence::repositories::{EventInput, EventRepository, RegistrationRepository};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath};
use crate::routes::registrations::with_children;

pub(crate) fn capacity_for(event: &Event, counts: Option<&EventCountsEntity>) -> CapacitySummary {
    let (confirmed, waitlisted, children) = counts
        .map(|c| (c.confirmed, c.waitlisted, c.total_children))
        .unwrap_or_default();
    CapacitySnapshot::new(event.total_slots, event.waitlist_slots, confirmed, waitlisted)
        .summary(children)
}

async fn with_capacity(
    repo: &EventRepository,
    events: Vec<EventEntity>,
) -> Result<Vec<EventWithCapacity>, ApiError> {
    let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let counts: HashMap<Uuid, EventCountsEntity> = repo.counts_for(&ids).await?;

    Ok(events
        .into_iter()
        .map(|entity| {
            let event: Event = entity.into();
            let capacity = capacity_for(&event, counts.get(&event.id));
            EventWithCapacity { event, capacity }
        })
        .collect())
}

fn event_input(event: &Event) -> EventInput {
    EventInput {
        title: event.title.clone(),
        slug: event.slug.clone(),
        description: event.description.clone(),
        event_date: event.event_date,
        start_time: event.start_time,
        end_time: event.end_time,
        venue: event.venue.clone(),
        category: event.category.clone(),
        total_slots: event.total_slots,
        waitlist_slots: event.waitlist_slots,
        registration_status: event.registration_status.into(),
        status: event.status.into(),
        photo_album_url: event.photo_album_url.clone(),
        reminder_enabled: event.reminder_enabled,
    }
}

async fn load_event(repo: &EventRepository, id: Uuid) -> Result<Event, ApiError> {
    repo.find_by_id(id)
        .await?
        .map(Event::from)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// List published events from today onward.
///
/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let today = Utc::now().date_naive();
    let events = repo.list_upcoming_published(today).await?;

    Ok(Json(ListEventsResponse {
        data: with_capacity(&repo, events).await?,
    }))
}

/// GET /api/events/:slug
pub async fn get_event(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<EventWithCapacity>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let event: Event = repo
        .find_published_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    let counts = repo.counts_for_event(event.id).await?;
    let capacity = capacity_for(&event, Some(&counts));
    Ok(Json(EventWithCapacity { event, capacity }))
}

/// Create an event. The slug is derived from the title when not given.
///
/// POST /api/admin/events
pub async fn create_event(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    request.validate()?;

    let slug = match &request.slug {
        Some(slug) => slug.clone(),
        None => shared::validation::slugify(&request.title),
    };
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Title must contain at least one letter or digit".to_string(),
        ));
    }

    let input = EventInput {
        title: request.title.trim().to_string(),
        slug,
        description: request.description,
        event_date: request.event_date,
        start_time: request.start_time,
        end_time: request.end_time,
        venue: request.venue,
        category: request.category,
        total_slots: request.total_slots,
        waitlist_slots: request.waitlist_slots,
        registration_status: request.registration_status.into(),
        status: request.status.into(),
        photo_album_url: request.photo_album_url,
        reminder_enabled: request.reminder_enabled,
    };

    let repo = EventRepository::new(state.pool.clone());
    let event: Event = repo.create(&input).await?.into();

    info!(event_id = %event.id, slug = %event.slug, status = %event.status, "Event created");
    Ok((StatusCode::CREATED, Json(event)))
}

/// Partially update an event.
///
/// PUT /api/admin/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    request.validate()?;

    let repo = EventRepository::new(state.pool.clone());
    let existing = load_event(&repo, id).await?;
    let merged = request.apply_to(&existing)?;

    let event: Event = repo
        .update(id, &event_input(&merged))
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    info!(event_id = %event.id, "Event updated");
    Ok(Json(event))
}

/// POST /api/admin/events/:id/status
pub async fn set_event_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateEventStatusRequest>,
) -> Result<Json<Event>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let event: Event = repo
        .set_status(id, request.status.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into();

    info!(event_id = %event.id, status = %event.status, "Event status changed");
    Ok(Json(event))
}

/// Every event, including drafts and past events.
///
/// GET /api/admin/events
pub async fn admin_list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let events = repo.list_all().await?;

    Ok(Json(ListEventsResponse {
        data: with_capacity(&repo, events).await?,
    }))
}

/// GET /api/admin/events/:id/registrations
pub async fn event_registrations(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventRegistrationsResponse>, ApiError> {
    let events = EventRepository::new(state.pool.clone());
    let registrations = RegistrationRepository::new(state.pool.clone());

    let event = load_event(&events, id).await?;
    let counts = events.counts_for_event(id).await?;
    let rows = registrations.list_for_event(id).await?;
    let data = with_children(&registrations, rows).await?;

    Ok(Json(EventRegistrationsResponse {
        event: EventSummary::from(&event),
        capacity: capacity_for(&event, Some(&counts)),
        data,
    }))
}

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::identity::CurrentUser, state::AppState},
    domain::{Event, EventData, EventDetails, EventFilter, Participant, Registration, Role, SeatAvailability, UserRegistration},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct CreateEventDto {
    #[serde(flatten)]
    event: EventData,
    #[serde(default)]
    badge_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventDto {
    #[serde(flatten)]
    event: EventData,
    /// Omitted leaves the badge set untouched.
    badge_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RegistrationDto {
    user_id: Option<Uuid>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationQuery {
    user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStatusDto {
    event_id: Uuid,
    user_id: Uuid,
    registered: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(mut filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>> {
    // Admins see everything, including events hidden from every audience
    filter.role = match user.role {
        Role::Admin => None,
        role => Some(role),
    };

    let events = state.service_context.event_service.list(&filter).await?;
    Ok(Json(events))
}

/// Loads the event, answering `EventNotFound` when the caller may not see it.
pub(crate) async fn visible_event(state: &AppState, user: &CurrentUser, id: Uuid) -> Result<Event> {
    state.service_context.event_service
        .find(id)
        .await?
        .filter(|event| user.can_see(&event.visibility))
        .ok_or(AppError::EventNotFound(id))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDetails>> {
    let details = state.service_context.event_service
        .get(id)
        .await?
        .ok_or(AppError::EventNotFound(id))?;

    if !user.can_see(&details.event.visibility) {
        return Err(AppError::EventNotFound(id));
    }

    Ok(Json(details))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(dto): Json<CreateEventDto>,
) -> Result<(StatusCode, Json<Event>)> {
    user.require_staff()?;
    let created_by = user.require_user()?;

    let event = state.service_context.event_service
        .create(created_by, dto.event, dto.badge_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateEventDto>,
) -> Result<Json<Event>> {
    user.require_staff()?;

    let event = state.service_context.event_service
        .update(id, dto.event, dto.badge_ids)
        .await?;

    Ok(Json(event))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    user.require_staff()?;

    if state.service_context.event_service.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::EventNotFound(id))
    }
}

pub async fn participants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Participant>>> {
    user.require_staff()?;

    let participants = state.service_context.registration_service
        .participants(id)
        .await?;

    Ok(Json(participants))
}

pub async fn seats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeatAvailability>> {
    visible_event(&state, &user, id).await?;

    let seats = state.service_context.registration_service
        .seats(id)
        .await?;

    Ok(Json(seats))
}

pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    dto: Option<Json<RegistrationDto>>,
) -> Result<(StatusCode, Json<Registration>)> {
    let dto = dto.map(|Json(dto)| dto).unwrap_or_default();
    let user_id = user.acting_for(dto.user_id)?;

    let registration = state.service_context.registration_service
        .register(id, user_id, dto.notes)
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    dto: Option<Json<RegistrationDto>>,
) -> Result<Json<Registration>> {
    let dto = dto.map(|Json(dto)| dto).unwrap_or_default();
    let user_id = user.acting_for(dto.user_id)?;

    let registration = state.service_context.registration_service
        .cancel(id, user_id)
        .await?;

    Ok(Json(registration))
}

pub async fn registration_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<RegistrationQuery>,
) -> Result<Json<RegistrationStatusDto>> {
    let user_id = user.acting_for(query.user_id)?;

    let registered = state.service_context.registration_service
        .is_registered(id, user_id)
        .await?;

    Ok(Json(RegistrationStatusDto { event_id: id, user_id, registered }))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<UserRegistration>>> {
    let user_id = user.require_user()?;

    let registrations = state.service_context.registration_service
        .upcoming_for_user(user_id)
        .await?;

    Ok(Json(registrations))
}

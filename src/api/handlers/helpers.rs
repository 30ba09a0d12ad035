use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{handlers::events::visible_event, middleware::identity::CurrentUser, state::AppState},
    domain::{AssignedHelper, Helper, HelperAssignment, HelperCommitment, Role},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    event_id: Option<Uuid>,
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct AssignHelperDto {
    helper_id: Uuid,
    #[serde(default)]
    confirmed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationDto {
    confirmed: bool,
}

pub async fn available(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Helper>>> {
    user.require_staff()?;

    let helpers = state.service_context.helper_service
        .find_available_helpers(query.event_id, query.date, query.start_time, query.end_time)
        .await?;

    Ok(Json(helpers))
}

pub async fn available_for_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Helper>>> {
    user.require_staff()?;

    let helpers = state.service_context.helper_service
        .find_available_helpers_for_event(event_id)
        .await?;

    Ok(Json(helpers))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<AssignedHelper>>> {
    visible_event(&state, &user, event_id).await?;

    let helpers = state.service_context.helper_service
        .event_helpers(event_id)
        .await?;

    Ok(Json(helpers))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
    Json(dto): Json<AssignHelperDto>,
) -> Result<(StatusCode, Json<HelperAssignment>)> {
    user.require_staff()?;

    let assignment = state.service_context.helper_service
        .assign_helper(event_id, dto.helper_id, dto.confirmed)
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn volunteer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<HelperAssignment>)> {
    if user.role != Role::Helper && !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    let helper_id = user.require_user()?;

    let assignment = state.service_context.helper_service
        .volunteer(event_id, helper_id)
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, helper_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    user.require_staff()?;

    state.service_context.helper_service
        .remove_helper(event_id, helper_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Staff confirm anyone; a helper may confirm or decline their own slot.
pub async fn confirm(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, helper_id)): Path<(Uuid, Uuid)>,
    Json(dto): Json<ConfirmationDto>,
) -> Result<StatusCode> {
    user.acting_for(Some(helper_id))?;

    state.service_context.helper_service
        .update_confirmation(event_id, helper_id, dto.confirmed)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn schedule(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(helper_id): Path<Uuid>,
) -> Result<Json<Vec<HelperCommitment>>> {
    user.acting_for(Some(helper_id))?;

    let schedule = state.service_context.helper_service
        .schedule(helper_id)
        .await?;

    Ok(Json(schedule))
}

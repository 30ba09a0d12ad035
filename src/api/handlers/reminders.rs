use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::identity::CurrentUser, state::AppState},
    domain::{CreateReminderRequest, PendingReminder, Reminder},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Reminder>>> {
    user.require_staff()?;

    let reminders = state.service_context.reminder_service
        .event_reminders(event_id)
        .await?;

    Ok(Json(reminders))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>)> {
    user.require_staff()?;

    let reminder = state.service_context.reminder_service
        .create_reminder(event_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Polled by the notification dispatcher.
pub async fn pending(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<PendingReminder>>> {
    user.require_admin()?;

    let reminders = state.service_context.reminder_service
        .pending_reminders()
        .await?;

    Ok(Json(reminders))
}

pub async fn mark_sent(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    user.require_admin()?;

    state.service_context.reminder_service
        .mark_reminder_sent(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

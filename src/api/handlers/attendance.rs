use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::identity::CurrentUser, state::AppState},
    domain::{AttendanceEntry, AttendanceRecord, Role},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct CheckInDto {
    user_id: Uuid,
    check_in_time: Option<DateTime<Utc>>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckOutDto {
    check_out_time: Option<DateTime<Utc>>,
}

/// Helpers run the check-in desk alongside leaders.
fn require_desk(user: &CurrentUser) -> Result<()> {
    if user.role == Role::Helper || user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceEntry>>> {
    require_desk(&user)?;

    let attendance = state.service_context.attendance_service
        .get_attendance(event_id)
        .await?;

    Ok(Json(attendance))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
    Json(dto): Json<CheckInDto>,
) -> Result<Json<AttendanceRecord>> {
    require_desk(&user)?;

    let record = state.service_context.attendance_service
        .record_attendance(event_id, dto.user_id, dto.check_in_time, dto.notes)
        .await?;

    Ok(Json(record))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
    dto: Option<Json<CheckOutDto>>,
) -> Result<StatusCode> {
    require_desk(&user)?;
    let dto = dto.map(|Json(dto)| dto).unwrap_or_default();

    state.service_context.attendance_service
        .record_check_out(event_id, user_id, dto.check_out_time)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

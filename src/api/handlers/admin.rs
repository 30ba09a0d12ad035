use axum::{
    extract::{State, Extension},
    Json,
};

use crate::{
    api::{middleware::identity::CurrentUser, state::AppState},
    domain::{Badge, EventStatistics, UpsertUserRequest, User},
    error::{AppError, Result},
};

pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<EventStatistics>> {
    user.require_staff()?;

    let stats = state.service_context.statistics_service
        .get_statistics()
        .await?;

    Ok(Json(stats))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<User>> {
    let user_id = user.require_user()?;

    let me = state.service_context.user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(me))
}

/// Directory sync from the identity provider.
pub async fn upsert_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<UpsertUserRequest>,
) -> Result<Json<User>> {
    user.require_admin()?;

    let synced = state.service_context.user_repo.upsert(request).await?;
    tracing::debug!(user_id = %synced.id, role = %synced.role, "Directory user synced");

    Ok(Json(synced))
}

pub async fn upsert_badge(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(badge): Json<Badge>,
) -> Result<Json<Badge>> {
    user.require_admin()?;

    let badge = state.service_context.badge_repo.upsert(badge).await?;
    Ok(Json(badge))
}

pub async fn list_badges(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<Json<Vec<Badge>>> {
    let badges = state.service_context.badge_repo.list().await?;
    Ok(Json(badges))
}

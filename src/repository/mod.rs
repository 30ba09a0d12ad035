use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::domain::*;
use crate::error::{AppError, Result};

pub mod attendance_repository;
pub mod badge_repository;
pub mod event_repository;
pub mod helper_repository;
pub mod registration_repository;
pub mod reminder_repository;
pub mod statistics_repository;
pub mod user_repository;

pub use attendance_repository::SqliteAttendanceRepository;
pub use badge_repository::SqliteBadgeRepository;
pub use event_repository::SqliteEventRepository;
pub use helper_repository::SqliteHelperRepository;
pub use registration_repository::SqliteRegistrationRepository;
pub use reminder_repository::SqliteReminderRepository;
pub use statistics_repository::SqliteStatisticsRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn upsert(&self, request: UpsertUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>>;
}

#[async_trait]
pub trait BadgeRepository: Send + Sync {
    async fn upsert(&self, badge: Badge) -> Result<Badge>;
    async fn list(&self) -> Result<Vec<Badge>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Inserts the event and its badge links atomically.
    async fn create(&self, created_by: Uuid, data: EventData, badge_ids: Vec<Uuid>) -> Result<Event>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn find_details(&self, id: Uuid) -> Result<Option<EventDetails>>;
    /// `upcoming` and `past` split on the event's start instant relative to `now`.
    async fn list(&self, filter: &EventFilter, now: NaiveDateTime) -> Result<Vec<Event>>;
    /// Replaces the badge set when `badge_ids` is `Some`.
    async fn update(&self, id: Uuid, data: EventData, badge_ids: Option<Vec<Uuid>>) -> Result<Event>;
    /// Removes the event and every owned row; `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn list_badges(&self, event_id: Uuid) -> Result<Vec<Badge>>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Capacity-guarded insert under the database write lock.
    async fn register(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Registration>;
    async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> Result<Registration>;
    async fn find_active(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>>;
    async fn count_active(&self, event_id: Uuid) -> Result<i64>;
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>>;
    async fn list_for_user(&self, user_id: Uuid, from: NaiveDate) -> Result<Vec<UserRegistration>>;
}

#[async_trait]
pub trait HelperRepository: Send + Sync {
    /// Conflict-checked upsert of `(event_id, helper_id)`.
    async fn assign(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<HelperAssignment>;
    async fn remove(&self, event_id: Uuid, helper_id: Uuid) -> Result<()>;
    async fn update_confirmation(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<bool>;
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<AssignedHelper>>;
    /// Every assignment to an event held on `date`.
    async fn commitments_on(&self, date: NaiveDate) -> Result<Vec<HelperCommitment>>;
    async fn list_for_helper(&self, helper_id: Uuid, from: NaiveDate) -> Result<Vec<HelperCommitment>>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn record_attendance(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        check_in_time: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<AttendanceRecord>;
    /// Returns whether a record was updated.
    async fn record_check_out(&self, event_id: Uuid, user_id: Uuid, check_out_time: DateTime<Utc>) -> Result<bool>;
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<AttendanceEntry>>;
}

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn create(&self, event_id: Uuid, request: CreateReminderRequest) -> Result<Reminder>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>>;
    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Reminder>>;
    async fn list_pending(&self, now: DateTime<Utc>) -> Result<Vec<PendingReminder>>;
    async fn mark_sent(&self, id: Uuid, sent_time: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    async fn compute(&self, today: NaiveDate, config: &SchedulingConfig) -> Result<EventStatistics>;
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Takes the SQLite write lock for the rest of the transaction by touching
/// the event row. Concurrent writers queue behind it until commit.
///
/// Returns `false` when the event does not exist.
pub(crate) async fn lock_event(tx: &mut Transaction<'_, Sqlite>, event_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE events SET updated_at = updated_at WHERE id = ?")
        .bind(event_id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn user_exists(tx: &mut Transaction<'_, Sqlite>, user_id: Uuid) -> Result<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(row.is_some())
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::{Participant, Registration, RegistrationStatus, UserRegistration},
    error::{AppError, Result},
    repository::{lock_event, parse_uuid, user_exists, utc, RegistrationRepository},
    scheduling::can_register,
};

#[derive(FromRow)]
struct RegistrationRow {
    id: String,
    event_id: String,
    user_id: String,
    registration_date: NaiveDateTime,
    status: String,
    notes: Option<String>,
}

#[derive(FromRow)]
struct ParticipantRow {
    id: String,
    event_id: String,
    user_id: String,
    registration_date: NaiveDateTime,
    status: String,
    notes: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
}

#[derive(FromRow)]
struct UserRegistrationRow {
    id: String,
    event_id: String,
    user_id: String,
    registration_date: NaiveDateTime,
    status: String,
    notes: Option<String>,
    title: String,
    start_date: NaiveDate,
    start_time: Option<NaiveTime>,
}

pub struct SqliteRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn to_registration(
        id: &str,
        event_id: &str,
        user_id: &str,
        registration_date: NaiveDateTime,
        status: &str,
        notes: Option<String>,
    ) -> Result<Registration> {
        Ok(Registration {
            id: parse_uuid(id)?,
            event_id: parse_uuid(event_id)?,
            user_id: parse_uuid(user_id)?,
            registration_date: utc(registration_date),
            status: Self::parse_status(status)?,
            notes,
        })
    }

    fn row_to_registration(row: RegistrationRow) -> Result<Registration> {
        Self::to_registration(
            &row.id,
            &row.event_id,
            &row.user_id,
            row.registration_date,
            &row.status,
            row.notes,
        )
    }

    pub(crate) fn parse_status(s: &str) -> Result<RegistrationStatus> {
        match s {
            "registered" => Ok(RegistrationStatus::Registered),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "attended" => Ok(RegistrationStatus::Attended),
            _ => Err(AppError::Database(format!("Invalid registration status: {}", s))),
        }
    }

    pub(crate) async fn find_active_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, event_id, user_id, registration_date, status, notes
            FROM event_participants
            WHERE event_id = ? AND user_id = ? AND status != 'cancelled'
            "#,
        )
        .bind(event_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_registration).transpose()
    }
}

#[async_trait]
impl RegistrationRepository for SqliteRegistrationRepository {
    async fn register(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Registration> {
        let event_id_str = event_id.to_string();
        let user_id_str = user_id.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        // Holding the write lock from here to commit makes count-then-insert
        // atomic with respect to every other registration.
        if !lock_event(&mut tx, event_id).await? {
            return Err(AppError::EventNotFound(event_id));
        }

        if !user_exists(&mut tx, user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        if Self::find_active_in_tx(&mut tx, event_id, user_id).await?.is_some() {
            return Err(AppError::AlreadyRegistered);
        }

        let (start_date, start_time, max_participants): (NaiveDate, Option<NaiveTime>, i32) = sqlx::query_as(
            "SELECT start_date, start_time, max_participants FROM events WHERE id = ?",
        )
        .bind(&event_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let starts_at = start_date.and_time(start_time.unwrap_or_default());
        if starts_at < now.naive_utc() {
            return Err(AppError::EventAlreadyStarted);
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = ? AND status != 'cancelled'",
        )
        .bind(&event_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if !can_register(max_participants, active) {
            return Err(AppError::CapacityExceeded { max_participants });
        }

        let id = Uuid::new_v4();
        let registered_at = now.naive_utc();

        sqlx::query(
            r#"
            INSERT INTO event_participants (id, event_id, user_id, registration_date, status, notes)
            VALUES (?, ?, ?, ?, 'registered', ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&event_id_str)
        .bind(&user_id_str)
        .bind(registered_at)
        .bind(&notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::AlreadyRegistered,
            other => AppError::Database(other.to_string()),
        })?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Registration {
            id,
            event_id,
            user_id,
            registration_date: utc(registered_at),
            status: RegistrationStatus::Registered,
            notes,
        })
    }

    async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> Result<Registration> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        let registration = Self::find_active_in_tx(&mut tx, event_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;

        if registration.status == RegistrationStatus::Attended {
            return Err(AppError::InvalidState(
                "Cannot cancel a registration that has already been attended".to_string(),
            ));
        }

        sqlx::query("UPDATE event_participants SET status = 'cancelled' WHERE id = ?")
            .bind(registration.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Registration {
            status: RegistrationStatus::Cancelled,
            ..registration
        })
    }

    async fn find_active(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, event_id, user_id, registration_date, status, notes
            FROM event_participants
            WHERE event_id = ? AND user_id = ? AND status != 'cancelled'
            "#,
        )
        .bind(event_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_registration(r)?)),
            None => Ok(None),
        }
    }

    async fn count_active(&self, event_id: Uuid) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM event_participants
            WHERE event_id = ? AND status != 'cancelled'
            "#,
        )
        .bind(event_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT p.id, p.event_id, p.user_id, p.registration_date, p.status, p.notes,
                   u.display_name, u.email
            FROM event_participants p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE p.event_id = ?
            ORDER BY p.registration_date ASC
            "#,
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(Participant {
                    registration: Self::to_registration(
                        &row.id,
                        &row.event_id,
                        &row.user_id,
                        row.registration_date,
                        &row.status,
                        row.notes,
                    )?,
                    display_name: row.display_name,
                    email: row.email,
                })
            })
            .collect()
    }

    async fn list_for_user(&self, user_id: Uuid, from: NaiveDate) -> Result<Vec<UserRegistration>> {
        let rows = sqlx::query_as::<_, UserRegistrationRow>(
            r#"
            SELECT p.id, p.event_id, p.user_id, p.registration_date, p.status, p.notes,
                   e.title, e.start_date, e.start_time
            FROM event_participants p
            INNER JOIN events e ON e.id = p.event_id
            WHERE p.user_id = ? AND p.status != 'cancelled' AND e.start_date >= ?
            ORDER BY e.start_date ASC, e.start_time ASC
            "#,
        )
        .bind(user_id.to_string())
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(UserRegistration {
                    registration: Self::to_registration(
                        &row.id,
                        &row.event_id,
                        &row.user_id,
                        row.registration_date,
                        &row.status,
                        row.notes,
                    )?,
                    event_title: row.title,
                    start_date: row.start_date,
                    start_time: row.start_time,
                })
            })
            .collect()
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{AttendanceEntry, AttendanceRecord},
    error::{AppError, Result},
    repository::{lock_event, parse_uuid, user_exists, utc, AttendanceRepository},
};

use super::SqliteRegistrationRepository;

#[derive(FromRow)]
struct AttendanceRow {
    event_id: String,
    user_id: String,
    check_in_time: NaiveDateTime,
    check_out_time: Option<NaiveDateTime>,
    notes: Option<String>,
}

#[derive(FromRow)]
struct AttendanceEntryRow {
    event_id: String,
    user_id: String,
    check_in_time: NaiveDateTime,
    check_out_time: Option<NaiveDateTime>,
    notes: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
}

pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
}

impl SqliteAttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: AttendanceRow) -> Result<AttendanceRecord> {
        Ok(AttendanceRecord {
            event_id: parse_uuid(&row.event_id)?,
            user_id: parse_uuid(&row.user_id)?,
            check_in_time: utc(row.check_in_time),
            check_out_time: row.check_out_time.map(utc),
            notes: row.notes,
        })
    }
}

#[async_trait]
impl AttendanceRepository for SqliteAttendanceRepository {
    async fn record_attendance(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        check_in_time: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<AttendanceRecord> {
        let event_id_str = event_id.to_string();
        let user_id_str = user_id.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        if !lock_event(&mut tx, event_id).await? {
            return Err(AppError::EventNotFound(event_id));
        }

        if !user_exists(&mut tx, user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let active = SqliteRegistrationRepository::find_active_in_tx(&mut tx, event_id, user_id).await?;

        // Only a cancelled registration on file means the participant withdrew;
        // no registration at all is a walk-in and is recorded as-is.
        if active.is_none() {
            let (cancelled,): (i64,) = sqlx::query_as(
                r#"
                SELECT COUNT(*) FROM event_participants
                WHERE event_id = ? AND user_id = ? AND status = 'cancelled'
                "#,
            )
            .bind(&event_id_str)
            .bind(&user_id_str)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

            if cancelled > 0 {
                return Err(AppError::RegistrationCancelled);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO event_attendance (event_id, user_id, check_in_time, notes)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET check_in_time = excluded.check_in_time,
                          notes = COALESCE(excluded.notes, event_attendance.notes)
            "#,
        )
        .bind(&event_id_str)
        .bind(&user_id_str)
        .bind(check_in_time.naive_utc())
        .bind(&notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(registration) = active {
            sqlx::query("UPDATE event_participants SET status = 'attended' WHERE id = ?")
                .bind(registration.id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT event_id, user_id, check_in_time, check_out_time, notes
            FROM event_attendance
            WHERE event_id = ? AND user_id = ?
            "#,
        )
        .bind(&event_id_str)
        .bind(&user_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Self::row_to_record(row)
    }

    async fn record_check_out(&self, event_id: Uuid, user_id: Uuid, check_out_time: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE event_attendance SET check_out_time = ? WHERE event_id = ? AND user_id = ?",
        )
        .bind(check_out_time.naive_utc())
        .bind(event_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<AttendanceEntry>> {
        let rows = sqlx::query_as::<_, AttendanceEntryRow>(
            r#"
            SELECT a.event_id, a.user_id, a.check_in_time, a.check_out_time, a.notes,
                   u.display_name, u.email
            FROM event_attendance a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.event_id = ?
            ORDER BY a.check_in_time ASC
            "#,
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(AttendanceEntry {
                    record: AttendanceRecord {
                        event_id: parse_uuid(&row.event_id)?,
                        user_id: parse_uuid(&row.user_id)?,
                        check_in_time: utc(row.check_in_time),
                        check_out_time: row.check_out_time.map(utc),
                        notes: row.notes,
                    },
                    display_name: row.display_name,
                    email: row.email,
                })
            })
            .collect()
    }
}

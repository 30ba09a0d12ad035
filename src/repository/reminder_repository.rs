use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateReminderRequest, PendingReminder, Reminder},
    error::{AppError, Result},
    repository::{parse_uuid, utc, ReminderRepository},
};

#[derive(FromRow)]
struct ReminderRow {
    id: String,
    event_id: String,
    reminder_type: String,
    reminder_time: NaiveDateTime,
    sent: i32,
    sent_time: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PendingReminderRow {
    id: String,
    event_id: String,
    reminder_type: String,
    reminder_time: NaiveDateTime,
    sent: i32,
    sent_time: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    title: String,
    start_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
}

pub struct SqliteReminderRepository {
    pool: SqlitePool,
}

impl SqliteReminderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_reminder(row: ReminderRow) -> Result<Reminder> {
        Ok(Reminder {
            id: parse_uuid(&row.id)?,
            event_id: parse_uuid(&row.event_id)?,
            reminder_type: row.reminder_type,
            reminder_time: utc(row.reminder_time),
            sent: row.sent != 0,
            sent_time: row.sent_time.map(utc),
            created_at: utc(row.created_at),
        })
    }
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepository {
    async fn create(&self, event_id: Uuid, request: CreateReminderRequest) -> Result<Reminder> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO event_reminders (id, event_id, reminder_type, reminder_time, sent, sent_time, created_at)
            VALUES (?, ?, ?, ?, 0, NULL, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(event_id.to_string())
        .bind(&request.reminder_type)
        .bind(request.reminder_time.naive_utc())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created reminder".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>> {
        let row = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT id, event_id, reminder_type, reminder_time, sent, sent_time, created_at
            FROM event_reminders
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_reminder(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT id, event_id, reminder_type, reminder_time, sent, sent_time, created_at
            FROM event_reminders
            WHERE event_id = ?
            ORDER BY reminder_time ASC
            "#,
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_reminder)
            .collect()
    }

    async fn list_pending(&self, now: DateTime<Utc>) -> Result<Vec<PendingReminder>> {
        let rows = sqlx::query_as::<_, PendingReminderRow>(
            r#"
            SELECT r.id, r.event_id, r.reminder_type, r.reminder_time, r.sent, r.sent_time, r.created_at,
                   e.title, e.start_date, e.start_time, e.end_time
            FROM event_reminders r
            INNER JOIN events e ON e.id = r.event_id
            WHERE r.sent = 0 AND r.reminder_time <= ?
            ORDER BY r.reminder_time ASC
            "#,
        )
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(PendingReminder {
                    reminder: Reminder {
                        id: parse_uuid(&row.id)?,
                        event_id: parse_uuid(&row.event_id)?,
                        reminder_type: row.reminder_type,
                        reminder_time: utc(row.reminder_time),
                        sent: row.sent != 0,
                        sent_time: row.sent_time.map(utc),
                        created_at: utc(row.created_at),
                    },
                    event_title: row.title,
                    event_date: row.start_date,
                    event_start_time: row.start_time,
                    event_end_time: row.end_time,
                })
            })
            .collect()
    }

    async fn mark_sent(&self, id: Uuid, sent_time: DateTime<Utc>) -> Result<bool> {
        // No statement ever clears `sent`, so the flag only moves forward.
        let result = sqlx::query("UPDATE event_reminders SET sent = 1, sent_time = ? WHERE id = ?")
            .bind(sent_time.naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

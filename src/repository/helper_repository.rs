use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::{AssignedHelper, HelperAssignment, HelperCommitment},
    error::{AppError, Result},
    repository::{lock_event, parse_uuid, user_exists, utc, HelperRepository},
    scheduling::{find_conflict, TimeWindow},
};

#[derive(FromRow)]
struct AssignedHelperRow {
    helper_id: String,
    display_name: Option<String>,
    email: Option<String>,
    confirmed: i32,
    assigned_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CommitmentRow {
    helper_id: String,
    event_id: String,
    title: String,
    start_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    confirmed: i32,
}

const COMMITMENT_SELECT: &str = r#"
    SELECT h.helper_id, h.event_id, e.title, e.start_date, e.start_time, e.end_time, h.confirmed
    FROM event_helpers h
    INNER JOIN events e ON e.id = h.event_id
"#;

pub struct SqliteHelperRepository {
    pool: SqlitePool,
}

impl SqliteHelperRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_commitment(row: CommitmentRow) -> Result<HelperCommitment> {
        Ok(HelperCommitment {
            helper_id: parse_uuid(&row.helper_id)?,
            event_id: parse_uuid(&row.event_id)?,
            event_title: row.title,
            start_date: row.start_date,
            start_time: row.start_time,
            end_time: row.end_time,
            confirmed: row.confirmed != 0,
        })
    }

    /// The helper's first commitment on another event that overlaps `window`.
    /// Callers hold the write lock so the answer stays true until commit.
    pub(crate) async fn conflict_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        helper_id: Uuid,
        event_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Option<HelperCommitment>> {
        let rows = sqlx::query_as::<_, CommitmentRow>(&format!(
            "{} WHERE h.helper_id = ? AND e.start_date = ? AND h.event_id != ?",
            COMMITMENT_SELECT
        ))
        .bind(helper_id.to_string())
        .bind(window.start.date())
        .bind(event_id.to_string())
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let commitments = rows
            .into_iter()
            .map(Self::row_to_commitment)
            .collect::<Result<Vec<_>>>()?;

        Ok(find_conflict(helper_id, window, Some(event_id), &commitments).cloned())
    }
}

#[async_trait]
impl HelperRepository for SqliteHelperRepository {
    async fn assign(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<HelperAssignment> {
        let event_id_str = event_id.to_string();
        let helper_id_str = helper_id.to_string();

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        if !lock_event(&mut tx, event_id).await? {
            return Err(AppError::EventNotFound(event_id));
        }

        if !user_exists(&mut tx, helper_id).await? {
            return Err(AppError::NotFound("Helper not found".to_string()));
        }

        let (start_date, start_time, end_time): (NaiveDate, Option<NaiveTime>, Option<NaiveTime>) =
            sqlx::query_as("SELECT start_date, start_time, end_time FROM events WHERE id = ?")
                .bind(&event_id_str)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        let window = TimeWindow::on(start_date, start_time, end_time);
        if let Some(conflict) = Self::conflict_in_tx(&mut tx, helper_id, event_id, &window).await? {
            return Err(AppError::HelperUnavailable {
                helper_id,
                conflicting_event_id: conflict.event_id,
            });
        }

        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            INSERT INTO event_helpers (event_id, helper_id, confirmed, assigned_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (event_id, helper_id)
            DO UPDATE SET confirmed = excluded.confirmed
            "#,
        )
        .bind(&event_id_str)
        .bind(&helper_id_str)
        .bind(confirmed as i32)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let (confirmed, assigned_at): (i32, NaiveDateTime) = sqlx::query_as(
            "SELECT confirmed, assigned_at FROM event_helpers WHERE event_id = ? AND helper_id = ?",
        )
        .bind(&event_id_str)
        .bind(&helper_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(HelperAssignment {
            event_id,
            helper_id,
            confirmed: confirmed != 0,
            assigned_at: utc(assigned_at),
        })
    }

    async fn remove(&self, event_id: Uuid, helper_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM event_helpers WHERE event_id = ? AND helper_id = ?")
            .bind(event_id.to_string())
            .bind(helper_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn update_confirmation(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE event_helpers SET confirmed = ? WHERE event_id = ? AND helper_id = ?",
        )
        .bind(confirmed as i32)
        .bind(event_id.to_string())
        .bind(helper_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<AssignedHelper>> {
        let rows = sqlx::query_as::<_, AssignedHelperRow>(
            r#"
            SELECT h.helper_id, u.display_name, u.email, h.confirmed, h.assigned_at
            FROM event_helpers h
            LEFT JOIN users u ON u.id = h.helper_id
            WHERE h.event_id = ?
            ORDER BY h.assigned_at ASC
            "#,
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(AssignedHelper {
                    helper_id: parse_uuid(&row.helper_id)?,
                    display_name: row.display_name,
                    email: row.email,
                    confirmed: row.confirmed != 0,
                    assigned_at: utc(row.assigned_at),
                })
            })
            .collect()
    }

    async fn commitments_on(&self, date: NaiveDate) -> Result<Vec<HelperCommitment>> {
        let rows = sqlx::query_as::<_, CommitmentRow>(&format!(
            "{} WHERE e.start_date = ?",
            COMMITMENT_SELECT
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_commitment)
            .collect()
    }

    async fn list_for_helper(&self, helper_id: Uuid, from: NaiveDate) -> Result<Vec<HelperCommitment>> {
        let rows = sqlx::query_as::<_, CommitmentRow>(&format!(
            "{} WHERE h.helper_id = ? AND e.start_date >= ? ORDER BY e.start_date ASC, e.start_time ASC",
            COMMITMENT_SELECT
        ))
        .bind(helper_id.to_string())
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_commitment)
            .collect()
    }
}

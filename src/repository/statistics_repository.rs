use async_trait::async_trait;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use sqlx::{FromRow, SqlitePool};

use crate::{
    config::SchedulingConfig,
    domain::{EventStatistics, MonthCount, PopularEvent, TypeCount, UnderstaffedEvent},
    error::{AppError, Result},
    repository::{parse_uuid, StatisticsRepository},
};

use super::SqliteEventRepository;

#[derive(FromRow)]
struct UnderstaffedRow {
    id: String,
    title: String,
    start_date: NaiveDate,
    start_time: Option<NaiveTime>,
    required_helpers: i32,
    current_helpers: i64,
}

#[derive(FromRow)]
struct PopularRow {
    id: String,
    title: String,
    start_date: NaiveDate,
    participant_count: i64,
}

pub struct SqliteStatisticsRepository {
    pool: SqlitePool,
}

impl SqliteStatisticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// First day of the month eleven months before `today`'s month, and the
    /// first day of the month after it.
    fn trailing_year(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let this_month = today.with_day(1).unwrap_or(today);
        let start = this_month
            .checked_sub_months(Months::new(11))
            .unwrap_or(this_month);
        let end = this_month
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        (start, end)
    }

    /// Last day of the understaffed look-ahead window.
    fn window_end(today: NaiveDate, days: i64) -> Result<NaiveDate> {
        Duration::try_days(days)
            .and_then(|window| today.checked_add_signed(window))
            .ok_or_else(|| {
                AppError::Validation(format!("Understaffed window of {} days is out of range", days))
            })
    }

    async fn count(&self, sql: &str, today: Option<NaiveDate>) -> Result<i64> {
        let mut query = sqlx::query_as::<_, (i64,)>(sql);
        if let Some(today) = today {
            query = query.bind(today);
        }
        let (count,) = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[async_trait]
impl StatisticsRepository for SqliteStatisticsRepository {
    async fn compute(&self, today: NaiveDate, config: &SchedulingConfig) -> Result<EventStatistics> {
        let total_events = self.count("SELECT COUNT(*) FROM events", None).await?;
        let upcoming_events = self
            .count("SELECT COUNT(*) FROM events WHERE start_date >= ?", Some(today))
            .await?;
        let total_active_participants = self
            .count(
                "SELECT COUNT(*) FROM event_participants WHERE status != 'cancelled'",
                None,
            )
            .await?;

        let type_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT event_type, COUNT(*) AS count
            FROM events
            GROUP BY event_type
            ORDER BY count DESC, event_type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let events_by_type = type_rows
            .into_iter()
            .map(|(event_type, count)| {
                Ok(TypeCount {
                    event_type: SqliteEventRepository::parse_event_type(&event_type)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (year_start, year_end) = Self::trailing_year(today);
        let month_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(start_date, 1, 7) AS month, COUNT(*) AS count
            FROM events
            WHERE start_date >= ? AND start_date < ?
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(year_start)
        .bind(year_end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let events_by_month = month_rows
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect();

        let window_end = Self::window_end(today, config.understaffed_window_days)?;
        let understaffed_rows = sqlx::query_as::<_, UnderstaffedRow>(
            r#"
            SELECT e.id, e.title, e.start_date, e.start_time, e.required_helpers,
                   COUNT(h.helper_id) AS current_helpers
            FROM events e
            LEFT JOIN event_helpers h ON h.event_id = e.id
            WHERE e.start_date >= ? AND e.start_date <= ? AND e.required_helpers > 0
            GROUP BY e.id
            HAVING COUNT(h.helper_id) < e.required_helpers
            ORDER BY e.start_date ASC, e.start_time ASC
            LIMIT ?
            "#,
        )
        .bind(today)
        .bind(window_end)
        .bind(config.understaffed_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let understaffed_events = understaffed_rows
            .into_iter()
            .map(|row| {
                Ok(UnderstaffedEvent {
                    event_id: parse_uuid(&row.id)?,
                    title: row.title,
                    start_date: row.start_date,
                    start_time: row.start_time,
                    required_helpers: row.required_helpers,
                    current_helpers: row.current_helpers,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let popular_rows = sqlx::query_as::<_, PopularRow>(
            r#"
            SELECT e.id, e.title, e.start_date, COUNT(p.id) AS participant_count
            FROM events e
            INNER JOIN event_participants p ON p.event_id = e.id AND p.status != 'cancelled'
            GROUP BY e.id
            ORDER BY participant_count DESC, e.start_date ASC
            LIMIT ?
            "#,
        )
        .bind(config.top_events_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let popular_events = popular_rows
            .into_iter()
            .map(|row| {
                Ok(PopularEvent {
                    event_id: parse_uuid(&row.id)?,
                    title: row.title,
                    start_date: row.start_date,
                    participant_count: row.participant_count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EventStatistics {
            total_events,
            upcoming_events,
            events_by_type,
            events_by_month,
            understaffed_events,
            total_active_participants,
            popular_events,
        })
    }
}

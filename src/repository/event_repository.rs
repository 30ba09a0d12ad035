use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    domain::{Badge, Event, EventData, EventDetails, EventFilter, EventType, Location, Role, Visibility},
    error::{AppError, Result},
    repository::{lock_event, parse_uuid, utc, EventRepository, HelperRepository, RegistrationRepository},
    scheduling::{fits_capacity, TimeWindow},
};

use super::{SqliteHelperRepository, SqliteRegistrationRepository};

pub(crate) const EVENT_COLUMNS: &str = r#"
    e.id, e.title, e.description, e.location_name, e.location_address,
    e.latitude, e.longitude, e.start_date, e.end_date, e.start_time, e.end_time,
    e.event_type, e.required_helpers, e.max_participants, e.created_by,
    e.public_visible, e.leaders_only_visible, e.helpers_only_visible,
    e.notes, e.equipment, e.cost, e.created_at, e.updated_at
"#;

#[derive(FromRow)]
pub(crate) struct EventRow {
    id: String,
    title: String,
    description: String,
    location_name: Option<String>,
    location_address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    event_type: String,
    required_helpers: i32,
    max_participants: i32,
    created_by: String,
    public_visible: i32,
    leaders_only_visible: i32,
    helpers_only_visible: i32,
    notes: Option<String>,
    equipment: Option<String>,
    cost: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct BadgeRow {
    id: String,
    name: String,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn row_to_event(row: EventRow) -> Result<Event> {
        Ok(Event {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            location: Location {
                name: row.location_name,
                address: row.location_address,
                latitude: row.latitude,
                longitude: row.longitude,
            },
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            end_time: row.end_time,
            event_type: Self::parse_event_type(&row.event_type)?,
            required_helpers: row.required_helpers,
            max_participants: row.max_participants,
            created_by: parse_uuid(&row.created_by)?,
            visibility: Visibility {
                public_visible: row.public_visible != 0,
                leaders_only_visible: row.leaders_only_visible != 0,
                helpers_only_visible: row.helpers_only_visible != 0,
            },
            notes: row.notes,
            equipment: row.equipment,
            cost: row.cost,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    pub(crate) fn parse_event_type(s: &str) -> Result<EventType> {
        match s {
            "meeting" => Ok(EventType::Meeting),
            "camp" => Ok(EventType::Camp),
            "hike" => Ok(EventType::Hike),
            "trip" => Ok(EventType::Trip),
            "service" => Ok(EventType::Service),
            "ceremony" => Ok(EventType::Ceremony),
            "training" => Ok(EventType::Training),
            "other" => Ok(EventType::Other),
            _ => Err(AppError::Database(format!("Invalid event type: {}", s))),
        }
    }

    pub(crate) fn event_type_to_str(event_type: &EventType) -> &'static str {
        match event_type {
            EventType::Meeting => "meeting",
            EventType::Camp => "camp",
            EventType::Hike => "hike",
            EventType::Trip => "trip",
            EventType::Service => "service",
            EventType::Ceremony => "ceremony",
            EventType::Training => "training",
            EventType::Other => "other",
        }
    }

    pub(crate) async fn fetch_in_tx(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events e WHERE e.id = ?",
            EVENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_event).transpose()
    }

    async fn insert_badge_links(
        tx: &mut Transaction<'_, Sqlite>,
        event_id: &str,
        badge_ids: &[Uuid],
    ) -> Result<()> {
        for badge_id in badge_ids {
            sqlx::query("INSERT OR IGNORE INTO event_badges (event_id, badge_id) VALUES (?, ?)")
                .bind(event_id)
                .bind(badge_id.to_string())
                .execute(&mut **tx)
                .await
                .map_err(|e| AppError::Database(format!("Failed to link badge {}: {}", badge_id, e)))?;
        }
        Ok(())
    }

    /// Events whose start (midnight when untimed) is before `now`. Matches the
    /// check that refuses registrations.
    fn push_started(query: &mut QueryBuilder<'_, Sqlite>, now: NaiveDateTime) {
        query
            .push(" (e.start_date < ")
            .push_bind(now.date())
            .push(" OR (e.start_date = ")
            .push_bind(now.date())
            .push(" AND COALESCE(e.start_time, '00:00:00') < ")
            .push_bind(now.time())
            .push("))");
    }

    fn push_visibility(query: &mut QueryBuilder<'_, Sqlite>, role: Role) {
        match role {
            Role::Public => {
                query.push(" AND e.public_visible = 1");
            }
            Role::Helper => {
                query.push(" AND (e.public_visible = 1 OR e.helpers_only_visible = 1)");
            }
            Role::Leader | Role::Admin => {
                query.push(" AND (e.public_visible = 1 OR e.leaders_only_visible = 1)");
            }
        }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, created_by: Uuid, data: EventData, badge_ids: Vec<Uuid>) -> Result<Event> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, location_name, location_address, latitude, longitude,
                start_date, end_date, start_time, end_time, event_type,
                required_helpers, max_participants, created_by,
                public_visible, leaders_only_visible, helpers_only_visible,
                notes, equipment, cost, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.location.name)
        .bind(&data.location.address)
        .bind(data.location.latitude)
        .bind(data.location.longitude)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(Self::event_type_to_str(&data.event_type))
        .bind(data.required_helpers)
        .bind(data.max_participants)
        .bind(created_by.to_string())
        .bind(data.visibility.public_visible as i32)
        .bind(data.visibility.leaders_only_visible as i32)
        .bind(data.visibility.helpers_only_visible as i32)
        .bind(&data.notes)
        .bind(&data.equipment)
        .bind(&data.cost)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Self::insert_badge_links(&mut tx, &id_str, &badge_ids).await?;

        let event = Self::fetch_in_tx(&mut tx, id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created event".to_string())
        })?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events e WHERE e.id = ?",
            EVENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_event(r)?)),
            None => Ok(None),
        }
    }

    async fn find_details(&self, id: Uuid) -> Result<Option<EventDetails>> {
        let Some(event) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let badges = self.list_badges(id).await?;
        let helpers = SqliteHelperRepository::new(self.pool.clone()).list_for_event(id).await?;
        let participants = SqliteRegistrationRepository::new(self.pool.clone())
            .list_for_event(id)
            .await?;

        Ok(Some(EventDetails {
            event,
            badges,
            helpers,
            participants,
        }))
    }

    async fn list(&self, filter: &EventFilter, now: NaiveDateTime) -> Result<Vec<Event>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM events e WHERE 1 = 1",
            EVENT_COLUMNS
        ));

        if filter.upcoming {
            query.push(" AND NOT");
            Self::push_started(&mut query, now);
        }
        if filter.past {
            query.push(" AND");
            Self::push_started(&mut query, now);
        }
        if let Some(event_type) = filter.event_type {
            query
                .push(" AND e.event_type = ")
                .push_bind(Self::event_type_to_str(&event_type));
        }
        if let Some(from) = filter.from {
            query.push(" AND e.start_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND e.start_date <= ").push_bind(to);
        }
        if let Some(created_by) = filter.created_by {
            query.push(" AND e.created_by = ").push_bind(created_by.to_string());
        }
        if let Some(badge_id) = filter.badge_id {
            query
                .push(" AND EXISTS (SELECT 1 FROM event_badges b WHERE b.event_id = e.id AND b.badge_id = ")
                .push_bind(badge_id.to_string())
                .push(")");
        }
        if let Some(role) = filter.role {
            Self::push_visibility(&mut query, role);
        }

        query.push(" ORDER BY e.start_date ASC, e.start_time ASC");

        let rows = query
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_event)
            .collect()
    }

    async fn update(&self, id: Uuid, data: EventData, badge_ids: Option<Vec<Uuid>>) -> Result<Event> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        // Registrations and helper assignments queue behind this lock, so the
        // checks below stay valid until commit.
        if !lock_event(&mut tx, id).await? {
            return Err(AppError::EventNotFound(id));
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = ? AND status != 'cancelled'",
        )
        .bind(&id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if !fits_capacity(data.max_participants, active) {
            return Err(AppError::CapacityExceeded { max_participants: data.max_participants });
        }

        let helper_rows: Vec<(String,)> = sqlx::query_as("SELECT helper_id FROM event_helpers WHERE event_id = ?")
            .bind(&id_str)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let window = TimeWindow::on(data.start_date, data.start_time, data.end_time);
        for (helper_id,) in helper_rows {
            let helper_id = parse_uuid(&helper_id)?;
            if let Some(conflict) = SqliteHelperRepository::conflict_in_tx(&mut tx, helper_id, id, &window).await? {
                return Err(AppError::HelperUnavailable {
                    helper_id,
                    conflicting_event_id: conflict.event_id,
                });
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, location_name = ?, location_address = ?,
                latitude = ?, longitude = ?, start_date = ?, end_date = ?,
                start_time = ?, end_time = ?, event_type = ?,
                required_helpers = ?, max_participants = ?,
                public_visible = ?, leaders_only_visible = ?, helpers_only_visible = ?,
                notes = ?, equipment = ?, cost = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.location.name)
        .bind(&data.location.address)
        .bind(data.location.latitude)
        .bind(data.location.longitude)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(Self::event_type_to_str(&data.event_type))
        .bind(data.required_helpers)
        .bind(data.max_participants)
        .bind(data.visibility.public_visible as i32)
        .bind(data.visibility.leaders_only_visible as i32)
        .bind(data.visibility.helpers_only_visible as i32)
        .bind(&data.notes)
        .bind(&data.equipment)
        .bind(&data.cost)
        .bind(now)
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::EventNotFound(id));
        }

        if let Some(badge_ids) = badge_ids {
            sqlx::query("DELETE FROM event_badges WHERE event_id = ?")
                .bind(&id_str)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            Self::insert_badge_links(&mut tx, &id_str, &badge_ids).await?;
        }

        let event = Self::fetch_in_tx(&mut tx, id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated event".to_string())
        })?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        // Children first; the foreign keys refuse to orphan them.
        for table in [
            "event_badges",
            "event_helpers",
            "event_participants",
            "event_attendance",
            "event_reminders",
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE event_id = ?", table))
                .bind(&id_str)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(format!("Failed to delete from {}: {}", table, e)))?;
        }

        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    async fn list_badges(&self, event_id: Uuid) -> Result<Vec<Badge>> {
        let rows = sqlx::query_as::<_, BadgeRow>(
            r#"
            SELECT b.id, b.name
            FROM badges b
            INNER JOIN event_badges eb ON eb.badge_id = b.id
            WHERE eb.event_id = ?
            ORDER BY b.name ASC
            "#,
        )
        .bind(event_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| Ok(Badge { id: parse_uuid(&r.id)?, name: r.name }))
            .collect()
    }
}

#![allow(dead_code)]

use campfire::{
    config::SchedulingConfig,
    db,
    domain::{Badge, EventData, EventType, Location, Role, UpsertUserRequest, User, Visibility},
    service::ServiceContext,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn setup() -> anyhow::Result<(SqlitePool, ServiceContext)> {
    let pool = db::connect_in_memory().await?;
    let ctx = ServiceContext::new(pool.clone(), SchedulingConfig::default());
    Ok((pool, ctx))
}

pub async fn user(ctx: &ServiceContext, name: &str, role: Role) -> anyhow::Result<User> {
    let user = ctx.user_repo
        .upsert(UpsertUserRequest {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            email: Some(format!("{}@troop.test", name.to_lowercase())),
            role,
        })
        .await?;
    Ok(user)
}

pub async fn badge(ctx: &ServiceContext, name: &str) -> anyhow::Result<Badge> {
    let badge = ctx.badge_repo
        .upsert(Badge { id: Uuid::new_v4(), name: name.to_string() })
        .await?;
    Ok(badge)
}

pub fn days_from_now(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn event_data(title: &str, date: NaiveDate) -> EventData {
    EventData {
        title: title.to_string(),
        description: String::new(),
        location: Location {
            name: Some("Scout hut".to_string()),
            ..Default::default()
        },
        start_date: date,
        end_date: None,
        start_time: Some(hm(10, 0)),
        end_time: Some(hm(12, 0)),
        event_type: EventType::Meeting,
        required_helpers: 0,
        max_participants: 0,
        visibility: Visibility::default(),
        notes: None,
        equipment: None,
        cost: None,
    }
}

pub fn timed(title: &str, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> EventData {
    EventData {
        start_time: Some(start),
        end_time: Some(end),
        ..event_data(title, date)
    }
}

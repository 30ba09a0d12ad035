use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use super::EventType;

#[derive(Debug, Clone, Serialize)]
pub struct EventStatistics {
    pub total_events: i64,
    pub upcoming_events: i64,
    pub events_by_type: Vec<TypeCount>,
    /// Trailing twelve months, oldest first, months without events omitted.
    pub events_by_month: Vec<MonthCount>,
    pub understaffed_events: Vec<UnderstaffedEvent>,
    pub total_active_participants: i64,
    pub popular_events: Vec<PopularEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub event_type: EventType,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderstaffedEvent {
    pub event_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub required_helpers: i32,
    pub current_helpers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularEvent {
    pub event_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub participant_count: i64,
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{AssignedHelper, Badge, Participant, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: EventType,
    pub required_helpers: i32,
    /// `0` means unlimited.
    pub max_participants: i32,
    pub created_by: Uuid,
    pub visibility: Visibility,
    pub notes: Option<String>,
    pub equipment: Option<String>,
    pub cost: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Start of the event; a missing start time means midnight.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Location {
    pub name: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Meeting,
    Camp,
    Hike,
    Trip,
    Service,
    Ceremony,
    Training,
    Other,
}

/// Which audiences may see an event. An event with every flag cleared is
/// only visible to unfiltered (administrative) listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub public_visible: bool,
    pub leaders_only_visible: bool,
    pub helpers_only_visible: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            public_visible: true,
            leaders_only_visible: false,
            helpers_only_visible: false,
        }
    }
}

impl Visibility {
    pub fn visible_to(&self, role: Role) -> bool {
        match role {
            Role::Public => self.public_visible,
            Role::Helper => self.public_visible || self.helpers_only_visible,
            Role::Leader | Role::Admin => self.public_visible || self.leaders_only_visible,
        }
    }
}

/// Scalar fields of an event as supplied by a create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventData {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(nested)]
    pub location: Location,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: EventType,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub required_helpers: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub max_participants: i32,
    #[serde(default)]
    pub visibility: Visibility,
    pub notes: Option<String>,
    pub equipment: Option<String>,
    pub cost: Option<String>,
}

/// An event together with everything hanging off it.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub badges: Vec<Badge>,
    pub helpers: Vec<AssignedHelper>,
    pub participants: Vec<Participant>,
}

/// Supported listing filters. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFilter {
    /// Events starting today or later.
    #[serde(default)]
    pub upcoming: bool,
    /// Events that started before today.
    #[serde(default)]
    pub past: bool,
    pub event_type: Option<EventType>,
    /// Inclusive lower bound on `start_date`.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `start_date`.
    pub to: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub badge_id: Option<Uuid>,
    /// Visibility is resolved from the caller, never from the query string.
    #[serde(skip)]
    pub role: Option<Role>,
}

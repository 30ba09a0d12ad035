use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registration_date: DateTime<Utc>,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Attended,
}

impl RegistrationStatus {
    /// Active registrations count against capacity.
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

/// A registration joined with the participant's directory entry.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    #[serde(flatten)]
    pub registration: Registration,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// A registration as seen from the user's side.
#[derive(Debug, Clone, Serialize)]
pub struct UserRegistration {
    pub registration: Registration,
    pub event_title: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Capacity snapshot of one event. `remaining` is `None` when unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatAvailability {
    pub event_id: Uuid,
    pub max_participants: i32,
    pub active_registrations: i64,
    pub remaining: Option<i64>,
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// `sent_time` is `Some` exactly when `sent` is true; once sent a reminder
/// never goes back to pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub event_id: Uuid,
    pub reminder_type: String,
    pub reminder_time: DateTime<Utc>,
    pub sent: bool,
    pub sent_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReminderRequest {
    #[validate(length(min = 1, max = 50))]
    pub reminder_type: String,
    pub reminder_time: DateTime<Utc>,
}

/// A due reminder with the event fields a dispatcher needs.
#[derive(Debug, Clone, Serialize)]
pub struct PendingReminder {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_start_time: Option<NaiveTime>,
    pub event_end_time: Option<NaiveTime>,
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduling::TimeWindow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperAssignment {
    pub event_id: Uuid,
    pub helper_id: Uuid,
    pub confirmed: bool,
    pub assigned_at: DateTime<Utc>,
}

/// A helper as listed on an event.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedHelper {
    pub helper_id: Uuid,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub confirmed: bool,
    pub assigned_at: DateTime<Utc>,
}

/// A candidate returned by the availability lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Helper {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
}

/// One event a helper is already committed to.
#[derive(Debug, Clone, Serialize)]
pub struct HelperCommitment {
    pub helper_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub confirmed: bool,
}

impl HelperCommitment {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::on(self.start_date, self.start_time, self.end_time)
    }
}

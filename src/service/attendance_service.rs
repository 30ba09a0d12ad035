use std::sync::Arc;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{AttendanceEntry, AttendanceRecord},
    error::{AppError, Result},
    repository::{AttendanceRepository, EventRepository},
};

pub struct AttendanceService {
    repo: Arc<dyn AttendanceRepository>,
    event_repo: Arc<dyn EventRepository>,
}

impl AttendanceService {
    pub fn new(repo: Arc<dyn AttendanceRepository>, event_repo: Arc<dyn EventRepository>) -> Self {
        Self { repo, event_repo }
    }

    /// Check a participant in. Recording twice keeps one record with the
    /// latest check-in time.
    pub async fn record_attendance(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        check_in_time: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<AttendanceRecord> {
        let check_in_time = check_in_time.unwrap_or_else(Utc::now);
        let record = self
            .repo
            .record_attendance(event_id, user_id, check_in_time, notes)
            .await?;

        tracing::info!(event_id = %event_id, user_id = %user_id, "Attendance recorded");
        Ok(record)
    }

    /// Without a check-in on file this changes nothing.
    pub async fn record_check_out(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        check_out_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let check_out_time = check_out_time.unwrap_or_else(Utc::now);
        let updated = self.repo.record_check_out(event_id, user_id, check_out_time).await?;

        if updated {
            tracing::info!(event_id = %event_id, user_id = %user_id, "Check-out recorded");
        } else {
            tracing::debug!(event_id = %event_id, user_id = %user_id, "Check-out without check-in ignored");
        }
        Ok(())
    }

    pub async fn get_attendance(&self, event_id: Uuid) -> Result<Vec<AttendanceEntry>> {
        if self.event_repo.find_by_id(event_id).await?.is_none() {
            return Err(AppError::EventNotFound(event_id));
        }
        self.repo.list_for_event(event_id).await
    }
}

use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{CreateReminderRequest, PendingReminder, Reminder},
    error::{AppError, Result},
    repository::{EventRepository, ReminderRepository},
};

pub struct ReminderService {
    repo: Arc<dyn ReminderRepository>,
    event_repo: Arc<dyn EventRepository>,
}

impl ReminderService {
    pub fn new(repo: Arc<dyn ReminderRepository>, event_repo: Arc<dyn EventRepository>) -> Self {
        Self { repo, event_repo }
    }

    pub async fn create_reminder(&self, event_id: Uuid, request: CreateReminderRequest) -> Result<Reminder> {
        request.validate()?;

        if self.event_repo.find_by_id(event_id).await?.is_none() {
            return Err(AppError::EventNotFound(event_id));
        }

        let reminder = self.repo.create(event_id, request).await?;
        tracing::info!(
            event_id = %event_id,
            reminder_id = %reminder.id,
            reminder_time = %reminder.reminder_time,
            "Reminder scheduled"
        );
        Ok(reminder)
    }

    /// Unsent reminders whose time has come, oldest first.
    pub async fn pending_reminders(&self) -> Result<Vec<PendingReminder>> {
        self.repo.list_pending(Utc::now()).await
    }

    /// Sending twice only moves `sent_time` forward.
    pub async fn mark_reminder_sent(&self, id: Uuid) -> Result<()> {
        if !self.repo.mark_sent(id, Utc::now()).await? {
            return Err(AppError::ReminderNotFound(id));
        }
        tracing::info!(reminder_id = %id, "Reminder marked sent");
        Ok(())
    }

    pub async fn event_reminders(&self, event_id: Uuid) -> Result<Vec<Reminder>> {
        self.repo.list_for_event(event_id).await
    }
}

use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{Participant, Registration, SeatAvailability, UserRegistration},
    error::{AppError, Result},
    repository::{EventRepository, RegistrationRepository},
    scheduling::remaining_seats,
};

pub struct RegistrationService {
    repo: Arc<dyn RegistrationRepository>,
    event_repo: Arc<dyn EventRepository>,
}

impl RegistrationService {
    pub fn new(repo: Arc<dyn RegistrationRepository>, event_repo: Arc<dyn EventRepository>) -> Self {
        Self { repo, event_repo }
    }

    pub async fn register(&self, event_id: Uuid, user_id: Uuid, notes: Option<String>) -> Result<Registration> {
        match self.repo.register(event_id, user_id, notes, Utc::now()).await {
            Ok(registration) => {
                tracing::info!(event_id = %event_id, user_id = %user_id, "Participant registered");
                Ok(registration)
            }
            Err(e) => {
                tracing::warn!(event_id = %event_id, user_id = %user_id, "Registration rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Marks the active registration cancelled; the row is kept.
    pub async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> Result<Registration> {
        let registration = self.repo.cancel(event_id, user_id).await?;
        tracing::info!(event_id = %event_id, user_id = %user_id, "Registration cancelled");
        Ok(registration)
    }

    pub async fn is_registered(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.repo.find_active(event_id, user_id).await?.is_some())
    }

    pub async fn participants(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        if self.event_repo.find_by_id(event_id).await?.is_none() {
            return Err(AppError::EventNotFound(event_id));
        }
        self.repo.list_for_event(event_id).await
    }

    /// Advisory only; `register` re-checks under the write lock.
    pub async fn seats(&self, event_id: Uuid) -> Result<SeatAvailability> {
        let event = self
            .event_repo
            .find_by_id(event_id)
            .await?
            .ok_or(AppError::EventNotFound(event_id))?;
        let active = self.repo.count_active(event_id).await?;

        Ok(SeatAvailability {
            event_id,
            max_participants: event.max_participants,
            active_registrations: active,
            remaining: remaining_seats(event.max_participants, active),
        })
    }

    /// A user's active registrations for events from today on.
    pub async fn upcoming_for_user(&self, user_id: Uuid) -> Result<Vec<UserRegistration>> {
        self.repo.list_for_user(user_id, Utc::now().date_naive()).await
    }
}

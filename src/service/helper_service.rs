use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{AssignedHelper, Helper, HelperAssignment, HelperCommitment, Role},
    error::{AppError, Result},
    repository::{EventRepository, HelperRepository, UserRepository},
    scheduling::{available_helpers, TimeWindow},
};

pub struct HelperService {
    repo: Arc<dyn HelperRepository>,
    event_repo: Arc<dyn EventRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl HelperService {
    pub fn new(
        repo: Arc<dyn HelperRepository>,
        event_repo: Arc<dyn EventRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self { repo, event_repo, user_repo }
    }

    /// Helpers with no overlapping assignment on `date` who are not already
    /// on `event_id`. `event_id` is optional so a form can ask before the
    /// event exists.
    pub async fn find_available_helpers(
        &self,
        event_id: Option<Uuid>,
        date: NaiveDate,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<Vec<Helper>> {
        let candidate = TimeWindow::on(date, start_time, end_time);

        let helpers = self
            .user_repo
            .list_by_role(Role::Helper)
            .await?
            .into_iter()
            .map(|u| Helper {
                id: u.id,
                display_name: u.display_name,
                email: u.email,
            })
            .collect();

        let mut commitments = self.repo.commitments_on(date).await?;

        // Assignments to this event count as "already assigned" even when
        // the event has since moved to another day.
        if let Some(event_id) = event_id {
            if let Some(event) = self.event_repo.find_by_id(event_id).await? {
                if event.start_date != date {
                    commitments.extend(self.repo.list_for_event(event_id).await?.into_iter().map(
                        |h| HelperCommitment {
                            helper_id: h.helper_id,
                            event_id,
                            event_title: event.title.clone(),
                            start_date: event.start_date,
                            start_time: event.start_time,
                            end_time: event.end_time,
                            confirmed: h.confirmed,
                        },
                    ));
                }
            }
        }

        Ok(available_helpers(helpers, &candidate, event_id, &commitments))
    }

    pub async fn find_available_helpers_for_event(&self, event_id: Uuid) -> Result<Vec<Helper>> {
        let event = self
            .event_repo
            .find_by_id(event_id)
            .await?
            .ok_or(AppError::EventNotFound(event_id))?;

        self.find_available_helpers(Some(event_id), event.start_date, event.start_time, event.end_time)
            .await
    }

    /// Insert or update the assignment. Rejected when the helper is already
    /// on an overlapping event.
    pub async fn assign_helper(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<HelperAssignment> {
        match self.repo.assign(event_id, helper_id, confirmed).await {
            Ok(assignment) => {
                tracing::info!(event_id = %event_id, helper_id = %helper_id, confirmed, "Helper assigned");
                Ok(assignment)
            }
            Err(e) => {
                tracing::warn!(event_id = %event_id, helper_id = %helper_id, "Helper assignment rejected: {}", e);
                Err(e)
            }
        }
    }

    /// A helper signing up themselves. An existing assignment is left as is.
    pub async fn volunteer(&self, event_id: Uuid, helper_id: Uuid) -> Result<HelperAssignment> {
        let existing = self
            .repo
            .list_for_event(event_id)
            .await?
            .into_iter()
            .find(|h| h.helper_id == helper_id);

        match existing {
            Some(h) => Ok(HelperAssignment {
                event_id,
                helper_id,
                confirmed: h.confirmed,
                assigned_at: h.assigned_at,
            }),
            None => self.assign_helper(event_id, helper_id, false).await,
        }
    }

    pub async fn remove_helper(&self, event_id: Uuid, helper_id: Uuid) -> Result<()> {
        self.repo.remove(event_id, helper_id).await?;
        tracing::info!(event_id = %event_id, helper_id = %helper_id, "Helper removed");
        Ok(())
    }

    pub async fn update_confirmation(&self, event_id: Uuid, helper_id: Uuid, confirmed: bool) -> Result<()> {
        if !self.repo.update_confirmation(event_id, helper_id, confirmed).await? {
            return Err(AppError::NotAssigned);
        }
        tracing::info!(event_id = %event_id, helper_id = %helper_id, confirmed, "Helper confirmation updated");
        Ok(())
    }

    pub async fn event_helpers(&self, event_id: Uuid) -> Result<Vec<AssignedHelper>> {
        self.repo.list_for_event(event_id).await
    }

    /// Upcoming assignments of one helper.
    pub async fn schedule(&self, helper_id: Uuid) -> Result<Vec<HelperCommitment>> {
        self.repo.list_for_helper(helper_id, Utc::now().date_naive()).await
    }
}

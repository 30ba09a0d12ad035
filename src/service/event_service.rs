use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{Badge, Event, EventData, EventDetails, EventFilter},
    error::{AppError, Result},
    repository::EventRepository,
};

pub struct EventService {
    repo: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// Create an event with its badge links
    pub async fn create(&self, created_by: Uuid, data: EventData, badge_ids: Vec<Uuid>) -> Result<Event> {
        validate_event(&data)?;

        let event = self.repo.create(created_by, data, badge_ids).await?;
        tracing::info!(event_id = %event.id, created_by = %created_by, "Event created");

        Ok(event)
    }

    /// Update scalar fields, replacing badge links when given
    pub async fn update(&self, id: Uuid, data: EventData, badge_ids: Option<Vec<Uuid>>) -> Result<Event> {
        validate_event(&data)?;

        match self.repo.update(id, data, badge_ids).await {
            Ok(event) => {
                tracing::info!(event_id = %id, "Event updated");
                Ok(event)
            }
            Err(e) => {
                tracing::warn!(event_id = %id, "Event update rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Delete an event and everything it owns
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!(event_id = %id, "Event deleted");
        }
        Ok(deleted)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Event>> {
        self.repo.find_by_id(id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EventDetails>> {
        self.repo.find_details(id).await
    }

    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        self.repo.list(filter, Utc::now().naive_utc()).await
    }

    pub async fn badges(&self, id: Uuid) -> Result<Vec<Badge>> {
        self.repo.list_badges(id).await
    }
}

fn validate_event(data: &EventData) -> Result<()> {
    data.validate()?;

    if let Some(end_date) = data.end_date {
        if end_date < data.start_date {
            return Err(AppError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
    }

    let single_day = data.end_date.map_or(true, |end| end == data.start_date);
    if let (true, Some(start), Some(end)) = (single_day, data.start_time, data.end_time) {
        if end <= start {
            return Err(AppError::Validation(
                "end_time must be after start_time".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, Location, Visibility};
    use chrono::{NaiveDate, NaiveTime};

    fn data() -> EventData {
        EventData {
            title: "Spring camp".to_string(),
            description: String::new(),
            location: Location::default(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: None,
            start_time: NaiveTime::from_hms_opt(10, 0, 0),
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            event_type: EventType::Camp,
            required_helpers: 2,
            max_participants: 10,
            visibility: Visibility::default(),
            notes: None,
            equipment: None,
            cost: None,
        }
    }

    #[test]
    fn accepts_well_formed_event() {
        assert!(validate_event(&data()).is_ok());
    }

    #[test]
    fn rejects_empty_title_and_negative_capacity() {
        let mut d = data();
        d.title = String::new();
        assert!(matches!(validate_event(&d), Err(AppError::Validation(_))));

        let mut d = data();
        d.max_participants = -1;
        assert!(matches!(validate_event(&d), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let mut d = data();
        d.end_date = NaiveDate::from_ymd_opt(2025, 5, 31);
        assert!(matches!(validate_event(&d), Err(AppError::Validation(_))));

        let mut d = data();
        d.end_time = NaiveTime::from_hms_opt(9, 0, 0);
        assert!(matches!(validate_event(&d), Err(AppError::Validation(_))));
    }

    #[test]
    fn overnight_event_may_end_earlier_in_the_day() {
        let mut d = data();
        d.end_date = NaiveDate::from_ymd_opt(2025, 6, 2);
        d.end_time = NaiveTime::from_hms_opt(9, 0, 0);
        assert!(validate_event(&d).is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut d = data();
        d.location.latitude = Some(123.0);
        assert!(matches!(validate_event(&d), Err(AppError::Validation(_))));
    }
}

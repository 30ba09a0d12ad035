//! Time windows and helper conflict detection.
//!
//! Windows are half-open: `[start, end)`. An event that ends at 12:00 does
//! not conflict with one that starts at 12:00.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Helper, HelperCommitment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Window of an event held on `date`.
    ///
    /// A missing start is midnight. A missing end, or one not after the
    /// start, runs to the end of the day.
    pub fn on(date: NaiveDate, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        let start_time = start.unwrap_or_default();
        let start = date.and_time(start_time);
        let end = match end {
            Some(end_time) if end_time > start_time => date.and_time(end_time),
            _ => end_of_day(date),
        };
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
        .checked_add_signed(Duration::days(1))
        .unwrap_or(NaiveDateTime::MAX)
}

/// First commitment of `helper_id` that collides with `candidate`, ignoring
/// the event being staffed.
pub fn find_conflict<'a>(
    helper_id: Uuid,
    candidate: &TimeWindow,
    event_id: Option<Uuid>,
    commitments: &'a [HelperCommitment],
) -> Option<&'a HelperCommitment> {
    commitments.iter().find(|c| {
        c.helper_id == helper_id
            && Some(c.event_id) != event_id
            && c.window().overlaps(candidate)
    })
}

/// Helpers free during `candidate` who are not already on `event_id`.
pub fn available_helpers(
    helpers: Vec<Helper>,
    candidate: &TimeWindow,
    event_id: Option<Uuid>,
    commitments: &[HelperCommitment],
) -> Vec<Helper> {
    let already_assigned: HashSet<Uuid> = commitments
        .iter()
        .filter(|c| Some(c.event_id) == event_id)
        .map(|c| c.helper_id)
        .collect();

    helpers
        .into_iter()
        .filter(|h| !already_assigned.contains(&h.id))
        .filter(|h| find_conflict(h.id, candidate, event_id, commitments).is_none())
        .collect()
}

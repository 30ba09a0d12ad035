//! Capacity guard for participant registrations.

/// Whether one more active registration fits.
///
/// `max_participants == 0` means the event is unbounded. The count must be
/// taken inside the same write transaction as the insert that follows.
pub fn can_register(max_participants: i32, active_registrations: i64) -> bool {
    max_participants <= 0 || active_registrations < i64::from(max_participants)
}

/// Whether a capacity change still holds every active registration.
pub fn fits_capacity(max_participants: i32, active_registrations: i64) -> bool {
    max_participants <= 0 || active_registrations <= i64::from(max_participants)
}

/// Seats left, or `None` for unbounded events.
pub fn remaining_seats(max_participants: i32, active_registrations: i64) -> Option<i64> {
    if max_participants <= 0 {
        return None;
    }
    Some((i64::from(max_participants) - active_registrations).max(0))
}

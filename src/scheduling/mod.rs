//! Pure decision logic consulted before scheduling writes commit.

pub mod availability;
pub mod capacity;

pub use availability::{available_helpers, find_conflict, TimeWindow};
pub use capacity::{can_register, fits_capacity, remaining_seats};

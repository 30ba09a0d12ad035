pub mod admin;
pub mod attendance;
pub mod events;
pub mod helpers;
pub mod reminders;
pub mod root;

pub mod badge;
pub mod event;
pub mod helper;
pub mod participant;
pub mod reminder;
pub mod statistics;
pub mod user;

pub use badge::*;
pub use event::*;
pub use helper::*;
pub use participant::*;
pub use reminder::*;
pub use statistics::*;
pub use user::*;

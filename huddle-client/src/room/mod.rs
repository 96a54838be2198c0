mod command;
mod coordinator;
mod events;

pub use command::{RoomCommand, RoomHandle};
pub use coordinator::RoomCoordinator;
pub use events::{LeaveReason, RoomEvents};

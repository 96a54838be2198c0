mod media;
mod participant;
mod room;
mod signaling;

pub use media::{CandidateInit, SdpType, SessionDescription, TrackKind};
pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::SignalMessage;

pub mod model;

pub use model::{
    CandidateInit, ParticipantId, RoomId, SdpType, SessionDescription, SignalMessage, TrackKind,
};

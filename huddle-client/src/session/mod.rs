mod negotiation;
mod registry;

pub use negotiation::NegotiationEngine;
pub use registry::{InboundTrack, PeerSession, SessionRegistry};

pub mod capture;
pub mod error;
pub mod room;
pub mod session;
pub mod signaling;
pub mod transport;
pub mod vad;

pub use capture::{AudioConstraints, CaptureConstraints, CaptureProvider, LocalStream, LocalTrack};
pub use error::{CaptureError, NegotiationError, RoomError, SignalingError};
pub use room::{LeaveReason, RoomCommand, RoomCoordinator, RoomEvents, RoomHandle};
pub use session::{NegotiationEngine, PeerSession, SessionRegistry};
pub use signaling::{SignalSender, SignalingConnector, signal_url};
pub use transport::{
    PeerTransport, PeerTransportFactory, RemoteTrack, TransportConfig, TransportEvent,
};
pub use vad::{
    ANALYSIS_WINDOW, SpeechMonitors, Transition, VadConfig, VadFrame, VoiceActivityDetector,
};

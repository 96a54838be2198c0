use thiserror::Error;

/// Failures of a single peer negotiation. None of these are fatal to the
/// room: the caller logs and the session survives (or, for `OfferInFlight`,
/// the caller defers).
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("an offer toward this peer is already in flight")]
    OfferInFlight,

    #[error("remote description rejected: {0}")]
    BadDescription(String),

    #[error("connectivity candidate rejected: {0}")]
    BadCandidate(String),

    #[error("peer transport failure: {0}")]
    Transport(String),
}

/// Local device acquisition failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("device access denied")]
    Denied,

    #[error("no capture device available")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to open signaling channel: {0}")]
    Connect(String),

    #[error("signaling channel closed")]
    Closed,
}

/// Errors surfaced to the embedder through `RoomEvents::on_error`. The
/// coordinator never crashes on any of these; it stays in (or returns to)
/// `Idle`.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room identifier must not be empty")]
    EmptyRoomId,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),
}

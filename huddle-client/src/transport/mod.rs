mod rtc_transport;

pub use rtc_transport::{RtcTransport, RtcTransportFactory};

use crate::capture::LocalTrack;
use crate::error::NegotiationError;
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::{CandidateInit, ParticipantId, SessionDescription, TrackKind};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

/// Inbound media track surfaced by a peer transport. Audio tracks may carry
/// a receiver of time-domain analysis windows for the voice-activity
/// detector; the channel closing means the stream ended.
#[derive(Debug)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
    pub samples: Option<mpsc::Receiver<Bytes>>,
}

/// Events a transport pushes into the coordinator loop, tagged with the
/// peer the connection belongs to.
#[derive(Debug)]
pub enum TransportEvent {
    RemoteTrack {
        peer_id: ParticipantId,
        track: RemoteTrack,
    },

    /// Trickle ICE: a local candidate was discovered and must be relayed.
    CandidateGenerated {
        peer_id: ParticipantId,
        candidate: CandidateInit,
    },

    /// The underlying connection failed or closed.
    Disconnected { peer_id: ParticipantId },
}

/// One peer connection, seen from the negotiation engine. `create_offer`
/// and `create_answer` register the produced description locally before
/// returning it.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String, NegotiationError>;

    async fn create_answer(&self) -> Result<String, NegotiationError>;

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError>;

    /// Discard any registered local offer and return to a stable signaling
    /// state, keeping outbound tracks attached. The polite side of glare
    /// calls this before applying the colliding remote offer.
    async fn rollback(&self) -> Result<(), NegotiationError>;

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    async fn remove_track(&self, track_id: &str) -> Result<(), NegotiationError>;

    /// Close the connection. Must be safe to call more than once.
    async fn close(&self);
}

/// Constructs one transport per peer session. `event_tx` is the
/// coordinator's shared event channel; every connection reports into it.
#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: ParticipantId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, NegotiationError>;
}

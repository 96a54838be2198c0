use crate::capture::LocalTrack;
use crate::error::NegotiationError;
use crate::session::NegotiationEngine;
use crate::signaling::SignalSender;
use crate::transport::{PeerTransportFactory, TransportEvent};
use huddle_core::{ParticipantId, TrackKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// An inbound track received from a remote participant.
#[derive(Debug, Clone)]
pub struct InboundTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// One entry per remote participant currently in the room.
pub struct PeerSession {
    pub peer_id: ParticipantId,
    pub engine: NegotiationEngine,
    pub inbound: Vec<InboundTrack>,
}

/// The set of active peer sessions, keyed by participant. Owned by one
/// room coordinator; never process-global.
pub struct SessionRegistry {
    local_id: ParticipantId,
    transports: Arc<dyn PeerTransportFactory>,
    signals: Arc<dyn SignalSender>,
    event_tx: mpsc::Sender<TransportEvent>,
    sessions: HashMap<ParticipantId, PeerSession>,
}

impl SessionRegistry {
    pub fn new(
        local_id: ParticipantId,
        transports: Arc<dyn PeerTransportFactory>,
        signals: Arc<dyn SignalSender>,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            local_id,
            transports,
            signals,
            event_tx,
            sessions: HashMap::new(),
        }
    }

    /// Create the session for a peer unless one already exists. The new
    /// transport is seeded with the current local tracks so the first offer
    /// already carries them. Returns whether a session was created.
    ///
    /// Idempotent: a second call for the same peer never builds a second
    /// session.
    pub async fn ensure(
        &mut self,
        peer_id: &ParticipantId,
        local_tracks: &[LocalTrack],
    ) -> Result<bool, NegotiationError> {
        if self.sessions.contains_key(peer_id) {
            debug!("Session for {} already exists", peer_id);
            return Ok(false);
        }

        let transport = self
            .transports
            .create(peer_id.clone(), self.event_tx.clone())
            .await?;

        for track in local_tracks {
            transport.add_track(track).await?;
        }

        let engine = NegotiationEngine::new(
            self.local_id.clone(),
            peer_id.clone(),
            transport,
            self.signals.clone(),
        );

        info!("Created session for {}", peer_id);
        self.sessions.insert(
            peer_id.clone(),
            PeerSession {
                peer_id: peer_id.clone(),
                engine,
                inbound: Vec::new(),
            },
        );
        Ok(true)
    }

    pub fn get_mut(&mut self, peer_id: &ParticipantId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(peer_id)
    }

    pub fn contains(&self, peer_id: &ParticipantId) -> bool {
        self.sessions.contains_key(peer_id)
    }

    /// Close the peer's connection and evict the entry. Returns whether a
    /// session existed.
    pub async fn remove(&mut self, peer_id: &ParticipantId) -> bool {
        let Some(session) = self.sessions.remove(peer_id) else {
            return false;
        };
        session.engine.close().await;
        info!("Removed session for {}", peer_id);
        true
    }

    /// Bulk teardown for room leave: close every connection and clear the
    /// map.
    pub async fn close_all(&mut self) {
        for (peer_id, session) in self.sessions.drain() {
            session.engine.close().await;
            debug!("Closed session for {}", peer_id);
        }
    }

    pub fn peer_ids(&self) -> Vec<ParticipantId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PeerSession> {
        self.sessions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

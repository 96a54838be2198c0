use async_trait::async_trait;
use huddle_client::{LeaveReason, RoomError, RoomEvents};
use huddle_core::{ParticipantId, TrackKind};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything the coordinator reported to the UI collaborator.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Joined(ParticipantId),
    Left(LeaveReason),
    PeerAdded(ParticipantId),
    PeerRemoved(ParticipantId),
    RemoteTrack {
        peer_id: ParticipantId,
        track_id: String,
        kind: TrackKind,
    },
    Speaking {
        participant: ParticipantId,
        speaking: bool,
    },
    Level {
        participant: ParticipantId,
        level: u8,
    },
    Error(String),
}

/// `RoomEvents` implementation that records every callback.
#[derive(Clone, Default)]
pub struct RecordingEvents {
    events: Arc<Mutex<Vec<ClientEvent>>>,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn events(&self) -> Vec<ClientEvent> {
        self.events.lock().await.clone()
    }

    /// Poll until some recorded event satisfies the predicate.
    pub async fn wait_for<F>(&self, pred: F, timeout_ms: u64) -> bool
    where
        F: Fn(&ClientEvent) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if self.events.lock().await.iter().any(&pred) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn joined_id(&self) -> Option<ParticipantId> {
        self.events.lock().await.iter().find_map(|e| match e {
            ClientEvent::Joined(id) => Some(id.clone()),
            _ => None,
        })
    }

    pub async fn left_reason(&self) -> Option<LeaveReason> {
        self.events.lock().await.iter().find_map(|e| match e {
            ClientEvent::Left(reason) => Some(*reason),
            _ => None,
        })
    }

    pub async fn has_peer_added(&self, peer_id: &ParticipantId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, ClientEvent::PeerAdded(id) if id == peer_id))
    }

    pub async fn has_peer_removed(&self, peer_id: &ParticipantId) -> bool {
        self.events
            .lock()
            .await
            .iter()
            .any(|e| matches!(e, ClientEvent::PeerRemoved(id) if id == peer_id))
    }

    pub async fn speaking_for(&self, participant: &ParticipantId) -> Vec<bool> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Speaking {
                    participant: p,
                    speaking,
                } if p == participant => Some(*speaking),
                _ => None,
            })
            .collect()
    }

    pub async fn levels_for(&self, participant: &ParticipantId) -> Vec<u8> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Level {
                    participant: p,
                    level,
                } if p == participant => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub async fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RoomEvents for RecordingEvents {
    async fn on_joined(&self, local_id: &ParticipantId) {
        self.events
            .lock()
            .await
            .push(ClientEvent::Joined(local_id.clone()));
    }

    async fn on_left(&self, reason: LeaveReason) {
        self.events.lock().await.push(ClientEvent::Left(reason));
    }

    async fn on_peer_added(&self, peer_id: &ParticipantId) {
        self.events
            .lock()
            .await
            .push(ClientEvent::PeerAdded(peer_id.clone()));
    }

    async fn on_peer_removed(&self, peer_id: &ParticipantId) {
        self.events
            .lock()
            .await
            .push(ClientEvent::PeerRemoved(peer_id.clone()));
    }

    async fn on_remote_track(&self, peer_id: &ParticipantId, track_id: &str, kind: TrackKind) {
        self.events.lock().await.push(ClientEvent::RemoteTrack {
            peer_id: peer_id.clone(),
            track_id: track_id.to_string(),
            kind,
        });
    }

    async fn on_speaking_changed(&self, participant: &ParticipantId, speaking: bool) {
        self.events.lock().await.push(ClientEvent::Speaking {
            participant: participant.clone(),
            speaking,
        });
    }

    async fn on_level(&self, participant: &ParticipantId, level: u8) {
        self.events.lock().await.push(ClientEvent::Level {
            participant: participant.clone(),
            level,
        });
    }

    async fn on_error(&self, error: &RoomError) {
        self.events
            .lock()
            .await
            .push(ClientEvent::Error(error.to_string()));
    }
}

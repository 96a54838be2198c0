use crate::error::RoomError;
use async_trait::async_trait;
use huddle_core::{ParticipantId, TrackKind};

/// Why the coordinator returned to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The user asked to leave.
    Explicit,
    /// The relay channel closed under us; sessions were torn down as if an
    /// explicit leave had happened.
    TransportLost,
}

/// Callbacks to the rendering/UI collaborator. All methods default to
/// no-ops so embedders implement only what they render.
///
/// `on_level` fires every analysis frame for every monitored participant;
/// `on_speaking_changed` only on debounced transitions.
#[async_trait]
pub trait RoomEvents: Send + Sync + 'static {
    async fn on_joined(&self, _local_id: &ParticipantId) {}

    async fn on_left(&self, _reason: LeaveReason) {}

    async fn on_peer_added(&self, _peer_id: &ParticipantId) {}

    async fn on_peer_removed(&self, _peer_id: &ParticipantId) {}

    async fn on_remote_track(&self, _peer_id: &ParticipantId, _track_id: &str, _kind: TrackKind) {}

    async fn on_speaking_changed(&self, _participant: &ParticipantId, _speaking: bool) {}

    async fn on_level(&self, _participant: &ParticipantId, _level: u8) {}

    async fn on_error(&self, _error: &RoomError) {}
}

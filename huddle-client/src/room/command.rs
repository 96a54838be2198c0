use huddle_core::RoomId;
use tokio::sync::mpsc;

/// Commands accepted by a running room coordinator.
#[derive(Debug)]
pub enum RoomCommand {
    /// Join a room: acquire local capture, open the relay channel and wait
    /// for the identity assignment.
    Join { room: RoomId },

    /// Leave the current room, tearing down every session.
    Leave,

    /// Mute/unmute the local audio track. No renegotiation.
    SetAudioEnabled(bool),

    /// Add or remove the local video track entirely. Renegotiates with
    /// every peer.
    SetVideoEnabled(bool),
}

/// Cheap cloneable handle to a coordinator task.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { tx }
    }

    /// Send a command. Dropped silently if the coordinator is gone.
    pub async fn send(&self, cmd: RoomCommand) {
        let _ = self.tx.send(cmd).await;
    }

    pub async fn join(&self, room: RoomId) {
        self.send(RoomCommand::Join { room }).await;
    }

    pub async fn leave(&self) {
        self.send(RoomCommand::Leave).await;
    }

    pub async fn set_audio_enabled(&self, on: bool) {
        self.send(RoomCommand::SetAudioEnabled(on)).await;
    }

    pub async fn set_video_enabled(&self, on: bool) {
        self.send(RoomCommand::SetVideoEnabled(on)).await;
    }
}

use crate::error::SignalingError;
use async_trait::async_trait;
use huddle_core::{RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outbound half of the relay channel. Implementations route the message to
/// the relay; delivery failures are theirs to log, the core never retries.
#[async_trait]
pub trait SignalSender: Send + Sync {
    async fn send(&self, msg: SignalMessage);
}

/// Opens the per-room relay channel. Returns the outbound sender and the
/// inbound message stream; the stream ending means the channel closed
/// (treated by the coordinator as an implicit leave). Dropping both halves
/// closes the channel.
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn connect(
        &self,
        room: &RoomId,
    ) -> Result<(Arc<dyn SignalSender>, mpsc::Receiver<SignalMessage>), SignalingError>;
}

/// Relay channel address for a room. The scheme mirrors the page's
/// transport security.
pub fn signal_url(host: &str, room: &RoomId, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{}://{}/ws/{}", scheme, host, room)
}

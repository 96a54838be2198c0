use crate::model::media::CandidateInit;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Messages exchanged over the per-room relay channel.
///
/// `Id`, `NewPeer` and `PeerLeft` are relay notifications; `Offer`, `Answer`
/// and `Candidate` are routed peer-to-peer by the relay using the `to`
/// field. Delivery is ordered per sender; nothing is guaranteed across
/// senders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// Relay assigns the local participant identifier on connect.
    Id { id: ParticipantId },

    /// A participant joined the room.
    NewPeer { id: ParticipantId },

    /// A participant left the room.
    PeerLeft { id: ParticipantId },

    Offer {
        sdp: String,
        to: ParticipantId,
        from: ParticipantId,
    },

    Answer {
        sdp: String,
        to: ParticipantId,
        from: ParticipantId,
    },

    Candidate {
        candidate: CandidateInit,
        to: ParticipantId,
        from: ParticipantId,
    },
}

impl SignalMessage {
    /// The sending participant, for routed messages. Relay notifications
    /// carry no sender.
    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            SignalMessage::Offer { from, .. }
            | SignalMessage::Answer { from, .. }
            | SignalMessage::Candidate { from, .. } => Some(from),
            _ => None,
        }
    }
}

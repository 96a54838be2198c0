use crate::capture::LocalTrack;
use crate::error::NegotiationError;
use crate::signaling::SignalSender;
use crate::transport::PeerTransport;
use huddle_core::{CandidateInit, ParticipantId, SessionDescription, SignalMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives the offer/answer/candidate exchange for one peer connection.
///
/// Every locally produced description or candidate leaves through the
/// `SignalSender`, tagged `{to: peer, from: local}`; that is the engine's
/// entire interface to the relay.
///
/// Glare (both sides offering at once) is resolved by identifier order:
/// the *polite* side (smaller id) rolls back its pending offer and accepts
/// the incoming one, the impolite side ignores it. Both sides converge on
/// the impolite side's offer with no error surfaced. The rollback goes
/// through the transport because the registered local description must be
/// discarded there too, not just in this engine's flags.
pub struct NegotiationEngine {
    local_id: ParticipantId,
    peer_id: ParticipantId,
    transport: Arc<dyn PeerTransport>,
    signals: Arc<dyn SignalSender>,
    offer_in_flight: bool,
    remote_description_set: bool,
    renegotiate_after_answer: bool,
    pending_candidates: Vec<CandidateInit>,
}

impl NegotiationEngine {
    pub fn new(
        local_id: ParticipantId,
        peer_id: ParticipantId,
        transport: Arc<dyn PeerTransport>,
        signals: Arc<dyn SignalSender>,
    ) -> Self {
        Self {
            local_id,
            peer_id,
            transport,
            signals,
            offer_in_flight: false,
            remote_description_set: false,
            renegotiate_after_answer: false,
            pending_candidates: Vec::new(),
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn offer_in_flight(&self) -> bool {
        self.offer_in_flight
    }

    fn polite(&self) -> bool {
        self.local_id < self.peer_id
    }

    /// Produce, register and emit a local offer. Errors with
    /// `OfferInFlight` while a previous offer awaits its answer; callers
    /// serialize negotiations per peer.
    pub async fn create_offer(&mut self) -> Result<(), NegotiationError> {
        if self.offer_in_flight {
            return Err(NegotiationError::OfferInFlight);
        }

        let sdp = self.transport.create_offer().await?;
        self.offer_in_flight = true;

        self.signals
            .send(SignalMessage::Offer {
                sdp,
                to: self.peer_id.clone(),
                from: self.local_id.clone(),
            })
            .await;
        Ok(())
    }

    /// Apply a remote offer and emit the answer. Resolves glare first.
    pub async fn handle_offer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if self.offer_in_flight {
            if !self.polite() {
                debug!(
                    "Glare with {}: impolite side, ignoring incoming offer",
                    self.peer_id
                );
                return Ok(());
            }
            debug!(
                "Glare with {}: polite side, rolling back pending offer",
                self.peer_id
            );
            self.transport.rollback().await?;
            self.offer_in_flight = false;
        }

        self.transport
            .set_remote_description(SessionDescription::offer(sdp))
            .await?;
        self.remote_description_set = true;
        self.flush_candidates().await;

        let answer = self.transport.create_answer().await?;
        self.signals
            .send(SignalMessage::Answer {
                sdp: answer,
                to: self.peer_id.clone(),
                from: self.local_id.clone(),
            })
            .await;

        // A track change deferred behind a rolled-back offer would otherwise
        // be lost: its answer is never coming. The answer we just emitted
        // settles the exchange, so renegotiate now.
        if std::mem::take(&mut self.renegotiate_after_answer) {
            debug!("Issuing deferred renegotiation toward {}", self.peer_id);
            self.create_offer().await?;
        }
        Ok(())
    }

    /// Complete the pending offer. Stray answers are logged and dropped.
    pub async fn handle_answer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if !self.offer_in_flight {
            warn!("Answer from {} with no offer in flight, ignoring", self.peer_id);
            return Ok(());
        }

        self.transport
            .set_remote_description(SessionDescription::answer(sdp))
            .await?;
        self.offer_in_flight = false;
        self.remote_description_set = true;
        self.flush_candidates().await;

        if std::mem::take(&mut self.renegotiate_after_answer) {
            debug!("Issuing deferred renegotiation toward {}", self.peer_id);
            self.create_offer().await?;
        }
        Ok(())
    }

    /// Apply a remote candidate, or queue it until the remote description
    /// lands. Queued candidates are never dropped silently.
    pub async fn handle_candidate(
        &mut self,
        candidate: CandidateInit,
    ) -> Result<(), NegotiationError> {
        if !self.remote_description_set {
            debug!(
                "Queueing candidate from {} until the description arrives",
                self.peer_id
            );
            self.pending_candidates.push(candidate);
            return Ok(());
        }
        self.transport.add_candidate(candidate).await
    }

    /// Emit a locally gathered candidate to the peer.
    pub async fn send_local_candidate(&self, candidate: CandidateInit) {
        self.signals
            .send(SignalMessage::Candidate {
                candidate,
                to: self.peer_id.clone(),
                from: self.local_id.clone(),
            })
            .await;
    }

    /// Add an outbound track and renegotiate. If an offer is already in
    /// flight the renegotiation is deferred until its answer lands.
    pub async fn add_track(&mut self, track: &LocalTrack) -> Result<(), NegotiationError> {
        self.transport.add_track(track).await?;
        self.renegotiate().await
    }

    /// Remove an outbound track and renegotiate (deferred like `add_track`).
    pub async fn remove_track(&mut self, track_id: &str) -> Result<(), NegotiationError> {
        self.transport.remove_track(track_id).await?;
        self.renegotiate().await
    }

    pub async fn close(&self) {
        self.transport.close().await;
    }

    async fn renegotiate(&mut self) -> Result<(), NegotiationError> {
        match self.create_offer().await {
            Err(NegotiationError::OfferInFlight) => {
                self.renegotiate_after_answer = true;
                Ok(())
            }
            other => other,
        }
    }

    async fn flush_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_candidate(candidate).await {
                warn!("Failed to apply queued candidate from {}: {}", self.peer_id, e);
            }
        }
    }
}

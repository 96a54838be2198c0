use crate::capture::{CaptureConstraints, CaptureProvider, LocalTrack};
use crate::error::RoomError;
use crate::room::command::{RoomCommand, RoomHandle};
use crate::room::events::{LeaveReason, RoomEvents};
use crate::session::{InboundTrack, SessionRegistry};
use crate::signaling::{SignalSender, SignalingConnector};
use crate::transport::{PeerTransportFactory, TransportEvent};
use crate::vad::{SpeechMonitors, VadConfig};
use bytes::Bytes;
use huddle_core::{ParticipantId, RoomId, SignalMessage, TrackKind};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Joining,
    Joined,
}

/// Top-level state machine of one room membership.
///
/// A single task owns all mutable state and drives three inputs: user
/// commands, inbound relay messages and peer-transport events. Negotiation
/// steps toward different peers never observe half-mutated local state
/// because they all run on this one task.
pub struct RoomCoordinator {
    command_rx: mpsc::Receiver<RoomCommand>,
    capture: Arc<dyn CaptureProvider>,
    connector: Arc<dyn SignalingConnector>,
    transports: Arc<dyn PeerTransportFactory>,
    events: Arc<dyn RoomEvents>,

    phase: Phase,
    local_id: Option<ParticipantId>,
    local_tracks: Vec<LocalTrack>,
    audio_tap: Option<mpsc::Receiver<Bytes>>,
    signals: Option<Arc<dyn SignalSender>>,
    signal_rx: Option<mpsc::Receiver<SignalMessage>>,
    registry: Option<SessionRegistry>,
    monitors: SpeechMonitors,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
}

impl RoomCoordinator {
    pub fn new(
        capture: Arc<dyn CaptureProvider>,
        connector: Arc<dyn SignalingConnector>,
        transports: Arc<dyn PeerTransportFactory>,
        events: Arc<dyn RoomEvents>,
        vad_config: VadConfig,
    ) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);

        let monitors = SpeechMonitors::new(vad_config, events.clone());

        let coordinator = Self {
            command_rx,
            capture,
            connector,
            transports,
            events,
            phase: Phase::Idle,
            local_id: None,
            local_tracks: Vec::new(),
            audio_tap: None,
            signals: None,
            signal_rx: None,
            registry: None,
            monitors,
            transport_tx,
            transport_rx,
        };

        (coordinator, RoomHandle::new(command_tx))
    }

    pub async fn run(mut self) {
        info!("Room coordinator started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }

                msg = recv_signal(&mut self.signal_rx) => {
                    match msg {
                        Some(msg) => self.handle_signal(msg).await,
                        None => self.handle_relay_closed().await,
                    }
                }

                evt = self.transport_rx.recv() => {
                    // We hold a sender, so this channel never closes.
                    if let Some(evt) = evt {
                        self.handle_transport_event(evt).await;
                    }
                }
            }
        }

        if self.phase != Phase::Idle {
            self.leave(LeaveReason::Explicit).await;
        }
        info!("Room coordinator finished");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { room } => self.join(room).await,

            RoomCommand::Leave => {
                if self.phase != Phase::Idle {
                    self.leave(LeaveReason::Explicit).await;
                }
            }

            RoomCommand::SetAudioEnabled(on) => {
                if let Some(track) = self
                    .local_tracks
                    .iter()
                    .find(|t| t.kind == TrackKind::Audio)
                {
                    track.set_enabled(on);
                    debug!("Local audio {}", if on { "unmuted" } else { "muted" });
                }
            }

            RoomCommand::SetVideoEnabled(on) => self.set_video_enabled(on).await,
        }
    }

    async fn join(&mut self, room: RoomId) {
        if self.phase != Phase::Idle {
            warn!("Join requested while already in a room, ignoring");
            return;
        }
        if room.is_empty() {
            self.events.on_error(&RoomError::EmptyRoomId).await;
            return;
        }

        let stream = match self.capture.acquire(&CaptureConstraints::default()).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Capture acquisition failed: {}", e);
                self.events.on_error(&RoomError::Capture(e)).await;
                return;
            }
        };

        let (signals, signal_rx) = match self.connector.connect(&room).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Failed to open relay channel for {}: {}", room, e);
                for track in &stream.tracks {
                    track.stop();
                }
                self.events.on_error(&RoomError::Signaling(e)).await;
                return;
            }
        };

        self.local_tracks = stream.tracks;
        self.audio_tap = stream.audio_tap;
        self.signals = Some(signals);
        self.signal_rx = Some(signal_rx);
        self.phase = Phase::Joining;
        info!("Joining room {}", room);
    }

    /// Best-effort teardown: relay channel, capture tracks, peer sessions
    /// and speech monitors. Every step runs regardless of the others.
    async fn leave(&mut self, reason: LeaveReason) {
        info!("Leaving room ({:?})", reason);

        self.signals = None;
        self.signal_rx = None;

        for track in self.local_tracks.drain(..) {
            track.stop();
        }
        self.audio_tap = None;

        if let Some(mut registry) = self.registry.take() {
            registry.close_all().await;
        }

        self.monitors.stop_all();

        self.local_id = None;
        self.phase = Phase::Idle;
        self.events.on_left(reason).await;
    }

    async fn handle_relay_closed(&mut self) {
        self.signal_rx = None;
        if self.phase != Phase::Idle {
            warn!("Relay channel closed unexpectedly");
            self.leave(LeaveReason::TransportLost).await;
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match self.phase {
            Phase::Idle => debug!("Signal while idle, ignoring"),
            Phase::Joining => self.handle_signal_joining(msg).await,
            Phase::Joined => self.handle_signal_joined(msg).await,
        }
    }

    async fn handle_signal_joining(&mut self, msg: SignalMessage) {
        let SignalMessage::Id { id } = msg else {
            debug!("Ignoring signal before the relay assigned an identity");
            return;
        };
        let Some(signals) = self.signals.clone() else {
            return;
        };

        info!("Assigned local identity {}", id);
        self.registry = Some(SessionRegistry::new(
            id.clone(),
            self.transports.clone(),
            signals,
            self.transport_tx.clone(),
        ));

        // Monitor our own microphone, as long as capture produced audio.
        if let Some(tap) = self.audio_tap.take() {
            if self
                .local_tracks
                .iter()
                .any(|t| t.kind == TrackKind::Audio)
            {
                self.monitors.start(id.clone(), tap);
            }
        }

        self.local_id = Some(id.clone());
        self.phase = Phase::Joined;
        self.events.on_joined(&id).await;
    }

    async fn handle_signal_joined(&mut self, msg: SignalMessage) {
        if let (Some(from), Some(local)) = (msg.sender(), self.local_id.as_ref()) {
            if from == local {
                trace!("Ignoring relay echo");
                return;
            }
        }

        match msg {
            SignalMessage::Id { .. } => warn!("Duplicate identity assignment, ignoring"),

            SignalMessage::NewPeer { id } => {
                if Some(&id) == self.local_id.as_ref() {
                    return;
                }
                // Existing members initiate toward newcomers, never the
                // reverse; the join path has no glare. A repeated
                // announcement for a live session must not renegotiate.
                if self.ensure_session(&id).await != Some(true) {
                    return;
                }
                if let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&id)) {
                    if let Err(e) = session.engine.create_offer().await {
                        error!("Failed to offer to {}: {}", id, e);
                    }
                }
            }

            SignalMessage::PeerLeft { id } => self.remove_peer(&id).await,

            SignalMessage::Offer { sdp, from, .. } => {
                if self.ensure_session(&from).await.is_none() {
                    return;
                }
                if let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&from)) {
                    if let Err(e) = session.engine.handle_offer(sdp).await {
                        warn!("Bad offer from {}: {}", from, e);
                    }
                }
            }

            SignalMessage::Answer { sdp, from, .. } => {
                if self.ensure_session(&from).await.is_none() {
                    return;
                }
                if let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&from)) {
                    if let Err(e) = session.engine.handle_answer(sdp).await {
                        warn!("Bad answer from {}: {}", from, e);
                    }
                }
            }

            SignalMessage::Candidate {
                candidate, from, ..
            } => {
                if self.ensure_session(&from).await.is_none() {
                    return;
                }
                if let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&from)) {
                    if let Err(e) = session.engine.handle_candidate(candidate).await {
                        warn!("Bad candidate from {}: {}", from, e);
                    }
                }
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::RemoteTrack { peer_id, track } => {
                // Late arrivals against an evicted session are no-ops.
                let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&peer_id))
                else {
                    debug!("Remote track for unknown session {}, dropping", peer_id);
                    return;
                };

                session.inbound.push(InboundTrack {
                    id: track.id.clone(),
                    kind: track.kind,
                });
                self.events
                    .on_remote_track(&peer_id, &track.id, track.kind)
                    .await;

                if track.kind == TrackKind::Audio {
                    if let Some(samples) = track.samples {
                        self.monitors.start(peer_id, samples);
                    }
                }
            }

            TransportEvent::CandidateGenerated { peer_id, candidate } => {
                let Some(session) = self.registry.as_mut().and_then(|r| r.get_mut(&peer_id))
                else {
                    debug!("Candidate for unknown session {}, dropping", peer_id);
                    return;
                };
                session.engine.send_local_candidate(candidate).await;
            }

            TransportEvent::Disconnected { peer_id } => {
                warn!("Connection to {} lost", peer_id);
                self.remove_peer(&peer_id).await;
            }
        }
    }

    /// Make sure a session exists for the peer. `Some(created)` on success,
    /// `None` when no session could be had.
    async fn ensure_session(&mut self, peer_id: &ParticipantId) -> Option<bool> {
        let registry = self.registry.as_mut()?;
        match registry.ensure(peer_id, &self.local_tracks).await {
            Ok(created) => {
                if created {
                    self.events.on_peer_added(peer_id).await;
                }
                Some(created)
            }
            Err(e) => {
                error!("Failed to create session for {}: {}", peer_id, e);
                None
            }
        }
    }

    async fn remove_peer(&mut self, peer_id: &ParticipantId) {
        let Some(registry) = self.registry.as_mut() else {
            return;
        };
        if registry.remove(peer_id).await {
            self.monitors.stop(peer_id);
            self.events.on_peer_removed(peer_id).await;
        }
    }

    async fn set_video_enabled(&mut self, on: bool) {
        if self.phase == Phase::Idle {
            return;
        }

        if on {
            if let Some(track) = self
                .local_tracks
                .iter()
                .find(|t| t.kind == TrackKind::Video)
            {
                track.set_enabled(true);
                return;
            }

            let track = match self.capture.acquire_video().await {
                Ok(track) => track,
                Err(e) => {
                    error!("Camera acquisition failed: {}", e);
                    self.events.on_error(&RoomError::Capture(e)).await;
                    return;
                }
            };

            // Mutate the local track set first, then fan out: no offer is
            // built against a stale set.
            self.local_tracks.push(track.clone());
            if let Some(registry) = self.registry.as_mut() {
                for session in registry.iter_mut() {
                    if let Err(e) = session.engine.add_track(&track).await {
                        error!("Video renegotiation with {} failed: {}", session.peer_id, e);
                    }
                }
            }
        } else {
            let Some(pos) = self
                .local_tracks
                .iter()
                .position(|t| t.kind == TrackKind::Video)
            else {
                return;
            };
            let track = self.local_tracks.remove(pos);
            track.stop();

            if let Some(registry) = self.registry.as_mut() {
                for session in registry.iter_mut() {
                    if let Err(e) = session.engine.remove_track(&track.id).await {
                        error!("Video renegotiation with {} failed: {}", session.peer_id, e);
                    }
                }
            }
        }
    }
}

/// Pends forever while no relay channel is open, so the select loop only
/// polls it mid-membership.
async fn recv_signal(rx: &mut Option<mpsc::Receiver<SignalMessage>>) -> Option<SignalMessage> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

use crate::capture::LocalTrack;
use crate::error::NegotiationError;
use crate::transport::{
    PeerTransport, PeerTransportFactory, RemoteTrack, TransportConfig, TransportEvent,
};
use async_trait::async_trait;
use huddle_core::{CandidateInit, ParticipantId, SdpType, SessionDescription, TrackKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

struct OutboundTrack {
    local: Arc<TrackLocalStaticSample>,
    sender: Arc<RTCRtpSender>,
}

/// Production `PeerTransport` over the `webrtc` crate.
///
/// One instance per remote participant. Callbacks report into the
/// coordinator's shared event channel, tagged with the peer id.
///
/// The underlying connection is replaceable: the `webrtc` crate has no SDP
/// rollback, so `rollback` rebuilds the connection and re-attaches the
/// outbound tracks.
pub struct RtcTransport {
    peer_id: ParticipantId,
    config: TransportConfig,
    event_tx: mpsc::Sender<TransportEvent>,
    peer_connection: Mutex<Arc<RTCPeerConnection>>,
    outbound: Mutex<HashMap<String, OutboundTrack>>,
}

impl RtcTransport {
    pub async fn new(
        peer_id: ParticipantId,
        config: TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, NegotiationError> {
        let peer_connection = build_connection(&peer_id, &config, &event_tx).await?;

        Ok(Self {
            peer_id,
            config,
            event_tx,
            peer_connection: Mutex::new(peer_connection),
            outbound: Mutex::new(HashMap::new()),
        })
    }

    async fn connection(&self) -> Arc<RTCPeerConnection> {
        self.peer_connection.lock().await.clone()
    }

    /// The sample sink for an outbound track, for the capture layer to
    /// write media into.
    pub async fn sample_writer(&self, track_id: &str) -> Option<Arc<TrackLocalStaticSample>> {
        self.outbound
            .lock()
            .await
            .get(track_id)
            .map(|t| t.local.clone())
    }
}

/// Build a wired peer connection: default codecs and interceptors, state
/// changes collapsed into `Disconnected`, trickle ICE and remote tracks
/// reported into the shared event channel.
async fn build_connection(
    peer_id: &ParticipantId,
    config: &TransportConfig,
    event_tx: &mpsc::Sender<TransportEvent>,
) -> Result<Arc<RTCPeerConnection>, NegotiationError> {
    let mut media = MediaEngine::default();
    media
        .register_default_codecs()
        .map_err(|e| NegotiationError::Transport(e.to_string()))?;
    let registry = register_default_interceptors(Registry::new(), &mut media)
        .map_err(|e| NegotiationError::Transport(e.to_string()))?;

    let api = APIBuilder::new()
        .with_media_engine(media)
        .with_interceptor_registry(registry)
        .build();

    let rtc_config = RTCConfiguration {
        ice_servers: vec![RTCIceServer {
            urls: config.ice_servers.clone(),
            credential: String::new(),
            username: String::new(),
        }],
        ..Default::default()
    };

    let peer_connection = Arc::new(
        api.new_peer_connection(rtc_config)
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?,
    );

    // Connection state: Failed/Disconnected/Closed all surface as one
    // Disconnected event; the coordinator evicts the session.
    let state_tx = event_tx.clone();
    let state_peer = peer_id.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let peer_id = state_peer.clone();

            Box::pin(async move {
                info!("Peer connection state for {}: {:?}", peer_id, s);
                match s {
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = tx.send(TransportEvent::Disconnected { peer_id }).await;
                    }
                    _ => {}
                }
            })
        },
    ));

    // Trickle ICE: locally gathered candidates go out through the relay.
    let ice_tx = event_tx.clone();
    let ice_peer = peer_id.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();
        let peer_id = ice_peer.clone();

        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let candidate = CandidateInit {
                candidate: init.candidate,
                sdp_mid: init.sdp_mid,
                sdp_m_line_index: init.sdp_mline_index,
            };
            let _ = tx
                .send(TransportEvent::CandidateGenerated { peer_id, candidate })
                .await;
        })
    }));

    let track_tx = event_tx.clone();
    let track_peer = peer_id.clone();
    peer_connection.on_track(Box::new(move |track, _, _| {
        let tx = track_tx.clone();
        let peer_id = track_peer.clone();

        Box::pin(async move {
            let kind = match track.kind() {
                RTPCodecType::Audio => TrackKind::Audio,
                _ => TrackKind::Video,
            };
            debug!("Remote {:?} track from {}", kind, peer_id);

            // TODO: feed decoded PCM analysis windows into `samples`
            // once an audio decode stage is wired behind this transport.
            let remote = RemoteTrack {
                id: track.id(),
                kind,
                samples: None,
            };
            let _ = tx
                .send(TransportEvent::RemoteTrack {
                    peer_id,
                    track: remote,
                })
                .await;
        })
    }));

    Ok(peer_connection)
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String, NegotiationError> {
        let pc = self.connection().await;
        let offer = pc
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?;
        pc.set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        let pc = self.connection().await;
        let answer = pc
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?;
        pc.set_local_description(answer.clone())
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = match desc.kind {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        }
        .map_err(|e| NegotiationError::BadDescription(e.to_string()))?;

        self.connection()
            .await
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::BadDescription(e.to_string()))
    }

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.connection()
            .await
            .add_ice_candidate(init)
            .await
            .map_err(|e| NegotiationError::BadCandidate(e.to_string()))
    }

    async fn rollback(&self) -> Result<(), NegotiationError> {
        debug!("Rebuilding connection to {} for rollback", self.peer_id);
        let fresh = build_connection(&self.peer_id, &self.config, &self.event_tx).await?;

        // Carry the outbound tracks over so the answer we are about to
        // produce still offers our media.
        let mut outbound = self.outbound.lock().await;
        for entry in outbound.values_mut() {
            let sender = fresh
                .add_track(Arc::clone(&entry.local) as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .map_err(|e| NegotiationError::Transport(e.to_string()))?;
            entry.sender = sender;
        }

        let old = {
            let mut pc = self.peer_connection.lock().await;
            std::mem::replace(&mut *pc, fresh)
        };

        // Silence the discarded connection before closing it; its shutdown
        // must not read as a connection loss.
        old.on_peer_connection_state_change(Box::new(|_| Box::pin(async {})));
        old.on_ice_candidate(Box::new(|_| Box::pin(async {})));
        if let Err(e) = old.close().await {
            debug!("Error discarding connection to {}: {}", self.peer_id, e);
        }
        Ok(())
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let (mime, stream_id) = match track.kind {
            TrackKind::Audio => (MIME_TYPE_OPUS, "huddle-audio"),
            TrackKind::Video => (MIME_TYPE_VP8, "huddle-video"),
        };

        let local = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime.to_owned(),
                ..Default::default()
            },
            track.id.clone(),
            stream_id.to_owned(),
        ));

        let sender = self
            .connection()
            .await
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))?;

        self.outbound
            .lock()
            .await
            .insert(track.id.clone(), OutboundTrack { local, sender });
        Ok(())
    }

    async fn remove_track(&self, track_id: &str) -> Result<(), NegotiationError> {
        let Some(outbound) = self.outbound.lock().await.remove(track_id) else {
            return Ok(());
        };
        self.connection()
            .await
            .remove_track(&outbound.sender)
            .await
            .map_err(|e| NegotiationError::Transport(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.connection().await.close().await {
            debug!("Error closing connection to {}: {}", self.peer_id, e);
        }
    }
}

/// Builds an `RtcTransport` per peer session.
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Default for RtcTransportFactory {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl PeerTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        peer_id: ParticipantId,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, NegotiationError> {
        let transport = RtcTransport::new(peer_id, self.config.clone(), event_tx).await?;
        Ok(Arc::new(transport))
    }
}

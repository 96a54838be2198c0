use crate::error::CaptureError;
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::TrackKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Audio processing hints passed to the device layer.
#[derive(Debug, Clone)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptureConstraints {
    pub audio: AudioConstraints,
    pub video: bool,
}

/// Handle to a locally captured media track.
///
/// The `enabled` flag implements mute without renegotiation; `stop()` marks
/// the track ended for good (room leave). Both flags are shared with the
/// device layer that produces the actual media.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    pub id: String,
    pub kind: TrackKind,
    enabled: Arc<AtomicBool>,
    ended: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Permanently stop the track. Idempotent.
    pub fn stop(&self) {
        self.ended.store(true, Ordering::Relaxed);
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Relaxed)
    }
}

/// A captured local stream: the device tracks plus, when audio was
/// requested, a tap of raw time-domain analysis windows feeding the local
/// voice-activity monitor.
pub struct LocalStream {
    pub tracks: Vec<LocalTrack>,
    pub audio_tap: Option<mpsc::Receiver<Bytes>>,
}

impl LocalStream {
    pub fn audio_track(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Audio)
    }

    pub fn video_track(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Video)
    }
}

/// Seam to the device layer (microphone/camera acquisition).
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Acquire the local capture stream for a room join.
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<LocalStream, CaptureError>;

    /// Acquire a camera track after the fact (video toggled on mid-call).
    async fn acquire_video(&self) -> Result<LocalTrack, CaptureError>;
}

use crate::room::RoomEvents;
use crate::vad::{Transition, VadConfig, VoiceActivityDetector};
use bytes::Bytes;
use huddle_core::ParticipantId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// The set of running voice-activity sampling tasks, one per monitored
/// participant.
///
/// Starting a monitor for an already-monitored participant is a no-op;
/// stopping one is idempotent and aborts the task, releasing its analysis
/// channel.
pub struct SpeechMonitors {
    config: VadConfig,
    events: Arc<dyn RoomEvents>,
    tasks: HashMap<ParticipantId, JoinHandle<()>>,
}

impl SpeechMonitors {
    pub fn new(config: VadConfig, events: Arc<dyn RoomEvents>) -> Self {
        Self {
            config,
            events,
            tasks: HashMap::new(),
        }
    }

    pub fn is_monitoring(&self, participant: &ParticipantId) -> bool {
        self.tasks.contains_key(participant)
    }

    /// Start sampling `windows` for a participant. The task pushes the level
    /// meter every frame and speaking transitions as they happen, and ends
    /// quietly when the window channel closes (stream ended).
    pub fn start(&mut self, participant: ParticipantId, windows: mpsc::Receiver<Bytes>) {
        if self.tasks.contains_key(&participant) {
            debug!("Already monitoring {}, ignoring", participant);
            return;
        }

        let detector = VoiceActivityDetector::new(self.config.clone());
        let task = tokio::spawn(run_monitor(
            participant.clone(),
            detector,
            windows,
            self.events.clone(),
        ));
        self.tasks.insert(participant, task);
    }

    pub fn stop(&mut self, participant: &ParticipantId) {
        if let Some(task) = self.tasks.remove(participant) {
            task.abort();
            debug!("Stopped monitoring {}", participant);
        }
    }

    pub fn stop_all(&mut self) {
        for (participant, task) in self.tasks.drain() {
            task.abort();
            trace!("Stopped monitoring {}", participant);
        }
    }
}

impl Drop for SpeechMonitors {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run_monitor(
    participant: ParticipantId,
    mut detector: VoiceActivityDetector,
    mut windows: mpsc::Receiver<Bytes>,
    events: Arc<dyn RoomEvents>,
) {
    while let Some(window) = windows.recv().await {
        let frame = detector.process_window(&window);

        events.on_level(&participant, frame.level).await;

        match frame.transition {
            Some(Transition::StartedSpeaking) => {
                events.on_speaking_changed(&participant, true).await;
            }
            Some(Transition::StoppedSpeaking) => {
                events.on_speaking_changed(&participant, false).await;
            }
            None => {}
        }
    }

    trace!("Audio stream for {} ended", participant);
}

//! Voice-activity detection.
//!
//! RMS over fixed time-domain windows, classified against an asymmetric
//! hysteresis band with asymmetric debounce: declaring speech is fast
//! (3 frames), declaring silence is slow (8 frames) so natural pauses
//! don't flicker the indicator.

/// Samples per analysis window.
pub const ANALYSIS_WINDOW: usize = 1024;

#[derive(Debug, Clone)]
pub struct VadConfig {
    /// RMS above this enters speaking (after `enter_frames` in a row).
    pub enter_threshold: f32,
    /// RMS below this enters silence (after `exit_frames` in a row).
    pub exit_threshold: f32,
    pub enter_frames: u32,
    pub exit_frames: u32,
    /// Empirical gain mapping RMS onto the 0-100 level meter.
    pub level_gain: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 0.045,
            exit_threshold: 0.020,
            enter_frames: 3,
            exit_frames: 8,
            level_gain: 2200.0,
        }
    }
}

/// Speaking-state change produced by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    StartedSpeaking,
    StoppedSpeaking,
}

/// Per-frame detector output. `level` is reported every frame regardless of
/// the debounced speaking state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadFrame {
    pub rms: f32,
    pub level: u8,
    pub transition: Option<Transition>,
}

/// Per-participant speech classifier. One instance per audio-bearing
/// participant, never shared.
#[derive(Debug)]
pub struct VoiceActivityDetector {
    config: VadConfig,
    speaking: bool,
    above: u32,
    below: u32,
}

impl VoiceActivityDetector {
    pub fn new(config: VadConfig) -> Self {
        Self {
            config,
            speaking: false,
            above: 0,
            below: 0,
        }
    }

    pub fn speaking(&self) -> bool {
        self.speaking
    }

    /// Classify one window of raw time-domain bytes (unsigned, centered at
    /// 128, as delivered by the analysis tap).
    pub fn process_window(&mut self, window: &[u8]) -> VadFrame {
        self.process_rms(window_rms(window))
    }

    /// Classify one frame given its RMS.
    pub fn process_rms(&mut self, rms: f32) -> VadFrame {
        let level = (rms * self.config.level_gain).round().min(100.0) as u8;

        if rms > self.config.enter_threshold {
            self.above += 1;
            self.below = 0;
        } else if rms < self.config.exit_threshold {
            self.below += 1;
            self.above = 0;
        }
        // Frames inside the hysteresis band leave both counters untouched.

        let transition = if !self.speaking && self.above >= self.config.enter_frames {
            self.speaking = true;
            Some(Transition::StartedSpeaking)
        } else if self.speaking && self.below >= self.config.exit_frames {
            self.speaking = false;
            Some(Transition::StoppedSpeaking)
        } else {
            None
        };

        VadFrame {
            rms,
            level,
            transition,
        }
    }
}

impl Default for VoiceActivityDetector {
    fn default() -> Self {
        Self::new(VadConfig::default())
    }
}

/// RMS of a window of unsigned time-domain bytes, each normalized to
/// [-1, 1].
pub fn window_rms(window: &[u8]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }

    let sum: f32 = window
        .iter()
        .map(|&b| {
            let v = (b as f32 - 128.0) / 128.0;
            v * v
        })
        .sum();
    (sum / window.len() as f32).sqrt()
}

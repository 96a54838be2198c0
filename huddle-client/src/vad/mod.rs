mod detector;
mod monitor;

pub use detector::{
    ANALYSIS_WINDOW, Transition, VadConfig, VadFrame, VoiceActivityDetector, window_rms,
};
pub use monitor::SpeechMonitors;

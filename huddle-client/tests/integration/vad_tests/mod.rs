pub mod test_remote_speaking_indicator;

use bytes::Bytes;
use huddle_client::ANALYSIS_WINDOW;

/// Full-scale square wave, RMS ~1.0.
pub fn loud_window() -> Bytes {
    let mut window = vec![0u8; ANALYSIS_WINDOW];
    for (i, b) in window.iter_mut().enumerate() {
        if i % 2 == 1 {
            *b = 255;
        }
    }
    Bytes::from(window)
}

/// Perfectly centered signal, RMS 0.
pub fn quiet_window() -> Bytes {
    Bytes::from(vec![128u8; ANALYSIS_WINDOW])
}

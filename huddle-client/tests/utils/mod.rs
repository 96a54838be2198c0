pub mod recording_events;

pub use mock_capture::*;
pub use mock_signaling::*;
pub use mock_transport::*;
pub use recording_events::*;

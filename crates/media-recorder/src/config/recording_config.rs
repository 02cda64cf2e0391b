use crate::config::{default_include_audio, default_max_recording_seconds};

use serde::{Deserialize, Serialize};

/// Recording behaviour of the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Recording stops by itself after this many seconds.
    #[serde(default = "default_max_recording_seconds")]
    pub max_recording_seconds: u64,

    /// Bind an audio member next to the video one.
    #[serde(default = "default_include_audio")]
    pub include_audio: bool,

    /// Request one combined audio+video capture instead of two.
    #[serde(default)]
    pub combined_capture: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_recording_seconds: default_max_recording_seconds(),
            include_audio: default_include_audio(),
            combined_capture: false,
        }
    }
}

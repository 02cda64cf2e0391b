use crate::config::default_volume;

use serde::{Deserialize, Serialize};

/// Playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Start muted.
    #[serde(default)]
    pub muted: bool,

    /// Volume used when playback starts.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            muted: false,
            volume: default_volume(),
        }
    }
}

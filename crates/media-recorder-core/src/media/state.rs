use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a track session or a session group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No device access granted and no source bound.
    #[default]
    Disabled,
    /// Live device track bound for preview.
    Capturing,
    /// Encoder is buffering the live track.
    Recording,
    /// Recording finalized or halted, position at the start.
    Stopped,
    /// Content is advancing.
    Playing,
    /// Content halted in place.
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Capturing => "capturing",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}

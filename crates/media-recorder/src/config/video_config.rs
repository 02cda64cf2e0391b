use crate::config::{default_video_frame_rate, default_video_height, default_video_width};

use serde::{Deserialize, Serialize};

/// Camera capture and recording frame settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Width in pixels.
    #[serde(default = "default_video_width")]
    pub width: u32,

    /// Height in pixels.
    #[serde(default = "default_video_height")]
    pub height: u32,

    /// Recording frame rate.
    #[serde(default = "default_video_frame_rate")]
    pub frame_rate: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_video_width(),
            height: default_video_height(),
            frame_rate: default_video_frame_rate(),
        }
    }
}

mod playback_config;
#[allow(clippy::module_inception)]
mod config;
mod recording_config;
mod video_config;

pub(crate) use {
    config::Config, playback_config::PlaybackConfig, recording_config::RecordingConfig,
    video_config::VideoConfig,
};

use media_recorder_core::{
    DEFAULT_MAX_RECORDING_SECONDS, DEFAULT_PLAYBACK_VOLUME, DEFAULT_VIDEO_FRAME_RATE,
    DEFAULT_VIDEO_HEIGHT, DEFAULT_VIDEO_WIDTH,
};

pub(crate) fn default_max_recording_seconds() -> u64 {
    DEFAULT_MAX_RECORDING_SECONDS
}

pub(crate) fn default_include_audio() -> bool {
    true
}

pub(crate) fn default_volume() -> f64 {
    DEFAULT_PLAYBACK_VOLUME
}

pub(crate) fn default_video_width() -> u32 {
    DEFAULT_VIDEO_WIDTH
}

pub(crate) fn default_video_height() -> u32 {
    DEFAULT_VIDEO_HEIGHT
}

pub(crate) fn default_video_frame_rate() -> u32 {
    DEFAULT_VIDEO_FRAME_RATE
}

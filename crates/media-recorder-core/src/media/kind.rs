use crate::{CoreResult, SessionError};

use std::{fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Default capture and recording width for video.
pub const DEFAULT_VIDEO_WIDTH: u32 = 640;
/// Default capture and recording height for video.
pub const DEFAULT_VIDEO_HEIGHT: u32 = 480;
/// Default recording frame rate for video.
pub const DEFAULT_VIDEO_FRAME_RATE: u32 = 10;
/// Volume applied when playback starts.
pub const DEFAULT_PLAYBACK_VOLUME: f64 = 0.5;

/// Kind of media a track session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Microphone only.
    Audio,
    /// Camera only.
    Video,
    /// Camera and microphone captured as one track.
    Multi,
}

impl MediaKind {
    /// Maps the type of a playback surface to the kind it can capture.
    ///
    /// Only `audio` and `video` surfaces exist; a combined capture is
    /// requested separately through the member binding.
    #[track_caller]
    pub fn from_surface_type(surface_type: &str) -> CoreResult<Self> {
        match surface_type.to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(SessionError::UnsupportedMediaKind {
                surface_type: surface_type.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Constraints passed to the device provider when capturing this kind.
    pub fn capture_constraints(&self, profile: &MediaProfile) -> CaptureConstraints {
        match self {
            Self::Video => CaptureConstraints {
                audio: false,
                video: VideoRequest::Exact {
                    width: profile.video_width,
                    height: profile.video_height,
                },
            },
            Self::Audio => CaptureConstraints {
                audio: true,
                video: VideoRequest::None,
            },
            Self::Multi => CaptureConstraints {
                audio: true,
                video: VideoRequest::Any,
            },
        }
    }

    /// Options handed to the encoder when recording this kind.
    pub fn recording_options(&self, profile: &MediaProfile) -> RecordingOptions {
        let video = VideoRecordSettings {
            width: profile.video_width,
            height: profile.video_height,
            frame_rate: profile.video_frame_rate,
        };

        match self {
            Self::Audio => RecordingOptions {
                container: RecordingContainer::Audio,
                include_audio: true,
                video: None,
            },
            Self::Video => RecordingOptions {
                container: RecordingContainer::Video,
                include_audio: false,
                video: Some(video),
            },
            Self::Multi => RecordingOptions {
                container: RecordingContainer::Video,
                include_audio: true,
                video: Some(video),
            },
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Multi => "multi",
        };
        f.write_str(name)
    }
}

impl FromStr for MediaKind {
    type Err = SessionError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "multi" | "multiple" => Ok(Self::Multi),
            _ => Err(SessionError::InvalidMediaKindRequested {
                requested: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Capture and recording parameters shared by every session of a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaProfile {
    /// Video width in pixels.
    pub video_width: u32,
    /// Video height in pixels.
    pub video_height: u32,
    /// Recording frame rate.
    pub video_frame_rate: u32,
    /// Volume set on the surface when playback starts.
    pub playback_volume: f64,
}

impl Default for MediaProfile {
    fn default() -> Self {
        Self {
            video_width: DEFAULT_VIDEO_WIDTH,
            video_height: DEFAULT_VIDEO_HEIGHT,
            video_frame_rate: DEFAULT_VIDEO_FRAME_RATE,
            playback_volume: DEFAULT_PLAYBACK_VOLUME,
        }
    }
}

/// Which video feed to request from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRequest {
    /// No video.
    None,
    /// Any camera resolution.
    Any,
    /// Exactly this resolution (minimum and maximum pinned).
    Exact {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// Device constraints for one capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Request the microphone.
    pub audio: bool,
    /// Request the camera.
    pub video: VideoRequest,
}

/// Container family produced by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingContainer {
    /// Audio-only clip.
    Audio,
    /// Video clip, optionally with audio.
    Video,
}

/// Frame settings for video recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoRecordSettings {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frames per second.
    pub frame_rate: u32,
}

/// Encoder configuration for one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingOptions {
    /// Output container.
    pub container: RecordingContainer,
    /// Whether audio is part of the clip.
    pub include_audio: bool,
    /// Video frame settings, absent for audio clips.
    pub video: Option<VideoRecordSettings>,
}

//! Collaborators a track session drives.
//!
//! Device access, encoding and the playback surface live outside this crate.
//! Hosts implement these traits and hand them to a
//! [`SessionGroup`](crate::SessionGroup) through a [`MediaBackend`].

use crate::media::{
    Blob, CaptureConstraints, HandleRegistry, MediaHandle, MediaKind, MediaProfile,
    RecordingOptions,
};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a [`DeviceProvider`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The user or user agent refused access.
    #[error("Permission denied: {reason}")]
    PermissionDenied {
        /// Description from the provider.
        reason: String,
    },

    /// No device can satisfy the request.
    #[error("Unsupported device: {reason}")]
    UnsupportedDevice {
        /// Description from the provider.
        reason: String,
    },
}

/// Failure reported by an [`Encoder`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// The buffered samples could not be turned into a clip.
    #[error("Finalize failed: {reason}")]
    FinalizeFailed {
        /// Description from the encoder.
        reason: String,
    },
}

/// A live feed from a capture device.
pub trait LiveTrack: Send {
    /// Stable identifier of the track.
    fn id(&self) -> &str;

    /// Kind of media the track carries.
    fn kind(&self) -> MediaKind;

    /// Stops every underlying device track.
    fn stop(&mut self);
}

/// Result of a granted capture request.
pub struct CapturedStream {
    /// The live track, owned by the session from now on.
    pub track: Box<dyn LiveTrack>,
    /// Address under which the track can be previewed.
    pub preview: MediaHandle,
}

/// Grants access to camera and microphone.
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Asks for a track of `kind`. May wait on the user indefinitely.
    async fn acquire(
        &self,
        kind: MediaKind,
        constraints: &CaptureConstraints,
    ) -> Result<CapturedStream, DeviceError>;
}

/// A finalized recording and the handle to play it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedRecording {
    /// Playable address of the recording.
    pub handle: MediaHandle,
    /// The encoded data.
    pub blob: Blob,
}

/// Buffers samples of one live track.
#[async_trait]
pub trait Encoder: Send {
    /// Begins buffering.
    fn start(&mut self);

    /// Stops buffering and yields an addressable recording.
    async fn finalize(&mut self) -> Result<FinalizedRecording, EncoderError>;
}

/// Builds encoders bound to a live track.
pub trait EncoderFactory: Send + Sync {
    /// Constructs an encoder for `track`.
    fn create(&self, track: &dyn LiveTrack, options: &RecordingOptions) -> Box<dyn Encoder>;
}

/// The media element a track session renders into.
pub trait PlaybackSurface: Send {
    /// Binds a stream or recording as the source.
    fn set_source(&mut self, handle: &MediaHandle);

    /// Starts or resumes playback.
    fn play(&mut self);

    /// Halts playback in place.
    fn pause(&mut self);

    /// Output volume, `0.0..=1.0`.
    fn set_volume(&mut self, volume: f64);

    /// Whether the surface starts playing as soon as a source is bound.
    fn set_autoplay(&mut self, autoplay: bool);

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Seeks to `seconds`.
    fn set_current_time(&mut self, seconds: f64);

    /// Length of the bound content in seconds. Infinite for live streams.
    fn duration(&self) -> f64;

    /// Mute flag, independent of the volume.
    fn muted(&self) -> bool;

    /// Sets the mute flag.
    fn set_muted(&mut self, muted: bool);

    /// Whether playback reached the end of the content.
    fn has_ended(&self) -> bool {
        false
    }
}

/// External collaborators shared by every session of a group.
#[derive(Clone)]
pub struct MediaBackend {
    /// Device access.
    pub devices: Arc<dyn DeviceProvider>,
    /// Encoder construction.
    pub encoders: Arc<dyn EncoderFactory>,
    /// Handle store used to revoke previews and recordings.
    pub handles: Arc<HandleRegistry>,
    /// Capture and recording parameters.
    pub profile: MediaProfile,
}

/// Arguments for adding a member to a session group.
pub struct MemberBinding {
    /// Surface the session renders into.
    pub surface: Box<dyn PlaybackSurface>,
    /// Type of the surface, `audio` or `video`.
    pub surface_type: String,
    /// Existing content to bind instead of capturing.
    pub source: Option<MediaHandle>,
    /// Request one combined audio and video capture.
    pub capture_all_media_types: bool,
}

impl MemberBinding {
    /// Binding for a surface that will capture live media.
    pub fn new(surface: Box<dyn PlaybackSurface>, surface_type: impl Into<String>) -> Self {
        Self {
            surface,
            surface_type: surface_type.into(),
            source: None,
            capture_all_media_types: false,
        }
    }

    /// Binds existing content instead of capturing.
    pub fn with_source(mut self, source: Option<MediaHandle>) -> Self {
        self.source = source;
        self
    }

    /// Requests one combined audio and video capture.
    pub fn capture_all_media_types(mut self, enabled: bool) -> Self {
        self.capture_all_media_types = enabled;
        self
    }
}

//! Media Recorder Core Library
//!
//! Capture, record and play back audio/video through one state machine,
//! with several media tracks driven in lockstep.
//!
//! Device access, encoding and the playback surface are collaborators the
//! host supplies through [`MediaBackend`].
//!
//! # Example
//!
//! ```no_run
//! use media_recorder_core::{MediaBackend, MemberBinding, PlaybackSurface, SessionGroup};
//!
//! async fn record_clip(
//!     backend: MediaBackend,
//!     video: Box<dyn PlaybackSurface>,
//!     audio: Box<dyn PlaybackSurface>,
//! ) -> media_recorder_core::CoreResult<()> {
//!     let group = SessionGroup::new(backend);
//!     group.add_member(MemberBinding::new(video, "video")).await?;
//!     group.add_member(MemberBinding::new(audio, "audio")).await?;
//!
//!     group.capture().await;
//!     group.record().await;
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     let outcome = group.stop().await;
//!
//!     for recording in outcome.recordings {
//!         println!("{}: {}", recording.kind, recording.recording_handle);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod media;

pub use {
    error::Result as CoreResult,
    error::SessionError,
    media::{
        Advanced, Blob, CaptureConstraints, CapturedStream, DEFAULT_MAX_RECORDING_SECONDS,
        DEFAULT_PLAYBACK_VOLUME, DEFAULT_VIDEO_FRAME_RATE, DEFAULT_VIDEO_HEIGHT,
        DEFAULT_VIDEO_WIDTH, DeviceError, DeviceProvider, Encoder, EncoderError, EncoderFactory,
        FinalizedRecording, GroupEvent, GroupSnapshot, HandleRegistry, HandleTarget, LiveTrack,
        MediaBackend, MediaHandle, MediaKind, MediaProfile, MemberBinding, MemberFailure,
        MemberSnapshot, PlaybackSurface, RecordingContainer, RecordingOptions, RecordingOutcome,
        SessionGroup, SessionState, StopOutcome, TrackSession, VideoRecordSettings, VideoRequest,
    },
};

mod backend;
mod handle;
mod kind;
pub(crate) mod session_group;
mod state;
pub(crate) mod timer;
mod track_session;

pub use {
    backend::{
        CapturedStream, DeviceError, DeviceProvider, Encoder, EncoderError, EncoderFactory,
        FinalizedRecording, LiveTrack, MediaBackend, MemberBinding, PlaybackSurface,
    },
    handle::{Blob, HandleRegistry, HandleTarget, MediaHandle},
    kind::{
        CaptureConstraints, DEFAULT_PLAYBACK_VOLUME, DEFAULT_VIDEO_FRAME_RATE,
        DEFAULT_VIDEO_HEIGHT, DEFAULT_VIDEO_WIDTH, MediaKind, MediaProfile, RecordingContainer,
        RecordingOptions, VideoRecordSettings, VideoRequest,
    },
    session_group::{
        Advanced, DEFAULT_MAX_RECORDING_SECONDS, GroupEvent, GroupSnapshot, MemberFailure,
        MemberSnapshot, SessionGroup, StopOutcome,
    },
    state::SessionState,
    track_session::{RecordingOutcome, TrackSession},
};

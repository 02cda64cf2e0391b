use crate::media::{DeviceError, EncoderError, MediaKind};

use error_location::ErrorLocation;
use thiserror::Error;

/// Media session errors with source location tracking.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The device capability request was rejected or is unsupported.
    #[error("Capture denied for {kind}: {source} {location}")]
    CaptureDenied {
        /// Kind of media that was requested.
        kind: MediaKind,
        /// Rejection reported by the device provider.
        #[source]
        source: DeviceError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A playback surface type has no matching media kind.
    #[error("Surface type '{surface_type}' is not supported as a media element {location}")]
    UnsupportedMediaKind {
        /// Surface type supplied at binding time.
        surface_type: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capability lookup named a media kind that does not exist.
    #[error("'{requested}' is not a valid type of media, it has to be audio, video or multi {location}")]
    InvalidMediaKindRequested {
        /// The unrecognized kind name.
        requested: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recording was requested without a bound live track.
    #[error("No active {kind} track to record from {location}")]
    NoActiveTrack {
        /// Kind of the session without a track.
        kind: MediaKind,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Finalizing was requested while the session is not recording.
    #[error("{kind} session is not recording {location}")]
    NotRecording {
        /// Kind of the session.
        kind: MediaKind,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The encoder could not finalize the recording.
    #[error("Finalizing {kind} recording failed: {source} {location}")]
    FinalizeFailed {
        /// Kind of the session being finalized.
        kind: MediaKind,
        /// Failure reported by the encoder.
        #[source]
        source: EncoderError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A device request or finalize for this session is still outstanding.
    #[error("{kind} session is busy: {operation} still in progress {location}")]
    ConcurrentOperation {
        /// Kind of the session.
        kind: MediaKind,
        /// The outstanding operation.
        operation: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A member index does not exist in the session group.
    #[error("No member at index {index} (group has {len}) {location}")]
    MemberNotFound {
        /// Requested member index.
        index: usize,
        /// Number of members in the group.
        len: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;

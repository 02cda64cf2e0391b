use crate::{
    media::{
        Blob, CaptureConstraints, CapturedStream, DeviceError, DeviceProvider, Encoder,
        EncoderError, FinalizedRecording, HandleRegistry, LiveTrack, MediaBackend, MediaHandle,
        MediaKind, MemberBinding, PlaybackSurface, SessionState,
    },
    {CoreResult, SessionError},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// A finalized recording of one track session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingOutcome {
    /// Kind of the session that produced the recording.
    pub kind: MediaKind,
    /// Playable address of the recording.
    pub recording_handle: MediaHandle,
    /// The encoded data.
    pub blob: Blob,
}

/// Collaborator call a session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    /// Device request, identified by its ticket.
    Capture(u64),
    Finalize,
}

/// First half of a capture.
pub(crate) enum CaptureStep {
    /// The existing preview was bound again; nothing to wait for.
    Rebound,
    /// A device request has to be awaited.
    Acquire(CaptureRequest),
}

/// A device request detached from its session, so it can be awaited
/// without holding the session.
pub(crate) struct CaptureRequest {
    ticket: u64,
    kind: MediaKind,
    constraints: CaptureConstraints,
    devices: Arc<dyn DeviceProvider>,
}

impl CaptureRequest {
    /// Waits for the device provider. May never resolve.
    pub(crate) async fn acquire(self) -> CaptureReply {
        let result = self.devices.acquire(self.kind, &self.constraints).await;

        CaptureReply {
            ticket: self.ticket,
            result,
        }
    }
}

/// Answer of the device provider, to be handed back to the session.
pub(crate) struct CaptureReply {
    ticket: u64,
    result: Result<CapturedStream, DeviceError>,
}

impl CaptureReply {
    /// Releases a stream nobody waits for anymore.
    pub(crate) fn discard(self, handles: &HandleRegistry) {
        if let Ok(CapturedStream { mut track, preview }) = self.result {
            track.stop();
            handles.revoke(&preview);
            debug!(track_id = track.id(), "Late stream released");
        }
    }
}

/// An encoder taken out of its session for finalizing.
pub(crate) struct FinalizeRequest {
    encoder: Box<dyn Encoder>,
}

impl FinalizeRequest {
    /// Runs the encoder's finalize.
    pub(crate) async fn finalize(mut self) -> FinalizeReply {
        let result = self.encoder.finalize().await;

        FinalizeReply {
            encoder: self.encoder,
            result,
        }
    }
}

/// Result of finalizing, to be handed back to the session.
pub(crate) struct FinalizeReply {
    encoder: Box<dyn Encoder>,
    result: Result<FinalizedRecording, EncoderError>,
}

impl FinalizeReply {
    /// Revokes a recording whose session is gone.
    pub(crate) fn discard(self, handles: &HandleRegistry) {
        if let Ok(finalized) = self.result {
            handles.revoke(&finalized.handle);
            debug!(recording = %finalized.handle, "Orphaned recording revoked");
        }
    }
}

/// Drives one playback surface through the capture/record/play lifecycle.
///
/// ```text
/// disabled -> capturing -> recording -> stopped -> playing <-> paused
///                 ^                        ^           |          |
///                 |                        +-----------+----------+
///                 +--- remove_recording() (from any state)
/// ```
///
/// The session owns its live track, its preview handle and its recording
/// handle. All of them are released when the session is dropped.
///
/// Device requests and finalizing run in two phases (`begin_*` and
/// `complete_*`) so that a [`SessionGroup`](crate::SessionGroup) can await
/// them without holding its lock. While one of them is outstanding, other
/// mutators fail with [`SessionError::ConcurrentOperation`].
pub struct TrackSession {
    kind: MediaKind,
    state: SessionState,
    surface: Box<dyn PlaybackSurface>,
    backend: MediaBackend,
    live_track: Option<Box<dyn LiveTrack>>,
    preview: Option<MediaHandle>,
    recording: Option<MediaHandle>,
    encoder: Option<Box<dyn Encoder>>,
    capturing_enabled: bool,
    pending: Pending,
    next_ticket: u64,
}

impl TrackSession {
    /// Binds a surface. Nothing is captured yet.
    ///
    /// With a source handle the surface starts on that content in the
    /// `paused` state; otherwise the session is `disabled` until
    /// [`capture`](Self::capture) succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedMediaKind`] if the surface type is
    /// neither `audio` nor `video`.
    #[track_caller]
    #[instrument(skip_all, fields(surface_type = %binding.surface_type))]
    pub fn new(binding: MemberBinding, backend: MediaBackend) -> CoreResult<Self> {
        let surface_kind = MediaKind::from_surface_type(&binding.surface_type)?;
        let kind = if binding.capture_all_media_types {
            MediaKind::Multi
        } else {
            surface_kind
        };

        let mut surface = binding.surface;
        surface.set_autoplay(false);
        surface.set_volume(0.0);

        let state = match &binding.source {
            Some(source) => {
                surface.set_source(source);
                SessionState::Paused
            }
            None => SessionState::Disabled,
        };

        info!(kind = %kind, state = %state, "Track session created");

        Ok(Self {
            kind,
            state,
            surface,
            backend,
            live_track: None,
            preview: None,
            recording: None,
            encoder: None,
            capturing_enabled: false,
            pending: Pending::Idle,
            next_ticket: 0,
        })
    }

    /// Binds the live preview to the surface.
    ///
    /// Re-uses the existing preview if there is one. Otherwise asks the
    /// device provider for a track, which may wait on the user indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CaptureDenied`] if the provider rejects the
    /// request, with the state left unchanged, and
    /// [`SessionError::ConcurrentOperation`] while another request is open.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn capture(&mut self) -> CoreResult<()> {
        let step = self.begin_capture()?;
        self.run_capture_step(step).await
    }

    #[track_caller]
    pub(crate) fn begin_capture(&mut self) -> CoreResult<CaptureStep> {
        self.ensure_idle()?;

        if let Some(preview) = &self.preview {
            self.surface.set_source(preview);
            self.surface.set_volume(0.0);
            self.surface.play();
            self.state = SessionState::Capturing;

            debug!(preview = %preview, "Existing preview re-bound");

            return Ok(CaptureStep::Rebound);
        }

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending = Pending::Capture(ticket);

        debug!(ticket, "Device requested");

        Ok(CaptureStep::Acquire(CaptureRequest {
            ticket,
            kind: self.kind,
            constraints: self.kind.capture_constraints(&self.backend.profile),
            devices: Arc::clone(&self.backend.devices),
        }))
    }

    /// Binds the granted track, or reports the denial.
    ///
    /// A reply to a request that [`stop_stream`](Self::stop_stream) cancelled
    /// is released and ignored.
    #[track_caller]
    pub(crate) fn complete_capture(&mut self, reply: CaptureReply) -> CoreResult<()> {
        if self.pending != Pending::Capture(reply.ticket) {
            reply.discard(&self.backend.handles);
            return Ok(());
        }
        self.pending = Pending::Idle;

        let kind = self.kind;
        let caller = Location::caller();
        let CapturedStream { track, preview } =
            reply.result.map_err(|source| SessionError::CaptureDenied {
                kind,
                source,
                location: ErrorLocation::from(caller),
            })?;

        let options = self.kind.recording_options(&self.backend.profile);
        self.encoder = Some(self.backend.encoders.create(track.as_ref(), &options));

        self.surface.set_source(&preview);
        self.surface.set_volume(0.0);
        self.surface.play();

        info!(track_id = track.id(), preview = %preview, "Capturing");

        self.live_track = Some(track);
        self.preview = Some(preview);
        self.capturing_enabled = true;
        self.state = SessionState::Capturing;

        Ok(())
    }

    async fn run_capture_step(&mut self, step: CaptureStep) -> CoreResult<()> {
        match step {
            CaptureStep::Rebound => Ok(()),
            CaptureStep::Acquire(request) => {
                let reply = request.acquire().await;
                self.complete_capture(reply)
            }
        }
    }

    /// Starts encoding the live track, discarding any previous recording.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveTrack`] if nothing has been captured
    /// and [`SessionError::ConcurrentOperation`] while a device request or
    /// finalize is open.
    #[track_caller]
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn record(&mut self) -> CoreResult<()> {
        self.ensure_idle()?;

        let track = self
            .live_track
            .as_deref()
            .ok_or_else(|| SessionError::NoActiveTrack {
                kind: self.kind,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut encoder = match self.encoder.take() {
            Some(encoder) => encoder,
            None => {
                let options = self.kind.recording_options(&self.backend.profile);
                self.backend.encoders.create(track, &options)
            }
        };

        self.revoke_recording();

        encoder.start();
        self.encoder = Some(encoder);
        self.state = SessionState::Recording;

        info!("Recording started");

        Ok(())
    }

    /// Finalizes the running recording and binds it as the playback source.
    ///
    /// Leaves the state untouched; [`stop`](Self::stop) sets it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotRecording`] outside the `recording` state and
    /// [`SessionError::FinalizeFailed`] if the encoder fails, in which case
    /// the session stays `recording`.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn stop_recording(&mut self) -> CoreResult<RecordingOutcome> {
        let request = self.begin_stop_recording()?;
        let reply = request.finalize().await;
        self.complete_stop_recording(reply)
    }

    #[track_caller]
    pub(crate) fn begin_stop_recording(&mut self) -> CoreResult<FinalizeRequest> {
        self.ensure_idle()?;

        let encoder = match (self.state, self.encoder.take()) {
            (SessionState::Recording, Some(encoder)) => encoder,
            (_, encoder) => {
                self.encoder = encoder;
                return Err(SessionError::NotRecording {
                    kind: self.kind,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.pending = Pending::Finalize;

        Ok(FinalizeRequest { encoder })
    }

    #[track_caller]
    pub(crate) fn complete_stop_recording(
        &mut self,
        reply: FinalizeReply,
    ) -> CoreResult<RecordingOutcome> {
        self.pending = Pending::Idle;

        let FinalizeReply { encoder, result } = reply;
        let finalized = match result {
            Ok(finalized) => finalized,
            Err(source) => {
                // Kept for another attempt while the track is still live.
                if self.live_track.is_some() {
                    self.encoder = Some(encoder);
                }
                return Err(SessionError::FinalizeFailed {
                    kind: self.kind,
                    source,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        // A finalized encoder is spent; the next record() builds a fresh one.
        drop(encoder);

        self.surface.set_source(&finalized.handle);
        self.recording = Some(finalized.handle.clone());

        info!(
            recording = %finalized.handle,
            size_bytes = finalized.blob.len(),
            "Recording finalized"
        );

        Ok(RecordingOutcome {
            kind: self.kind,
            recording_handle: finalized.handle,
            blob: finalized.blob,
        })
    }

    /// Halts everything and rewinds to the start.
    ///
    /// Finalizes first when recording; the outcome is returned in that case.
    ///
    /// # Errors
    ///
    /// Propagates [`stop_recording`](Self::stop_recording) failures without
    /// leaving the `recording` state.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn stop(&mut self) -> CoreResult<Option<RecordingOutcome>> {
        let outcome = if self.state == SessionState::Recording {
            Some(self.stop_recording().await?)
        } else {
            None
        };

        self.finish_stop(outcome.is_some());

        Ok(outcome)
    }

    /// Rewinds a session that has nothing (left) to finalize.
    pub(crate) fn finish_stop(&mut self, finalized: bool) {
        self.surface.set_current_time(0.0);
        self.surface.pause();
        self.surface.set_volume(0.0);
        self.state = SessionState::Stopped;

        info!(kind = %self.kind, finalized, "Stopped");
    }

    /// Resumes playback from the current position at the nominal volume.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn play(&mut self) {
        self.surface.play();
        self.surface.set_volume(self.backend.profile.playback_volume);
        self.state = SessionState::Playing;

        debug!("Playing");
    }

    /// Halts playback in place.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn pause(&mut self) {
        self.surface.pause();
        self.surface.set_volume(0.0);
        self.state = SessionState::Paused;

        debug!("Paused");
    }

    /// Drops the recording and goes back to live preview.
    ///
    /// # Errors
    ///
    /// Propagates [`capture`](Self::capture) failures; the session is left
    /// `disabled` in that case.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn remove_recording(&mut self) -> CoreResult<()> {
        let step = self.begin_remove_recording()?;
        self.run_capture_step(step).await
    }

    #[track_caller]
    pub(crate) fn begin_remove_recording(&mut self) -> CoreResult<CaptureStep> {
        self.ensure_idle()?;

        self.revoke_recording();
        self.state = SessionState::Disabled;

        info!(kind = %self.kind, "Recording removed");

        self.begin_capture()
    }

    /// Releases the live track and revokes its preview. No-op without a track.
    ///
    /// Also cancels an open device request: a track granted later is
    /// released right away.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn stop_stream(&mut self) {
        if let Pending::Capture(ticket) = self.pending {
            self.pending = Pending::Idle;
            debug!(ticket, "Device request cancelled");
        }

        let Some(mut track) = self.live_track.take() else {
            debug!("No live track to stop");
            return;
        };

        track.stop();
        self.encoder = None;

        if let Some(preview) = self.preview.take() {
            self.backend.handles.revoke(&preview);
        }

        // Without a track there is nothing left to preview or record.
        if matches!(self.state, SessionState::Capturing | SessionState::Recording) {
            self.state = SessionState::Disabled;
        }

        info!(track_id = track.id(), "Stream stopped");
    }

    /// Stops the session if its surface played to the end.
    ///
    /// Returns whether the session was stopped. A playing session has
    /// nothing to finalize, so this never waits.
    pub fn handle_playback_ended(&mut self) -> bool {
        if self.state != SessionState::Playing || !self.surface.has_ended() {
            return false;
        }

        debug!(kind = %self.kind, "Playback reached the end");

        self.finish_stop(false);
        true
    }

    /// Kind of media this session captures.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a finalized recording is bound.
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Handle of the finalized recording, if any.
    pub fn recording_handle(&self) -> Option<&MediaHandle> {
        self.recording.as_ref()
    }

    /// Handle of the live preview, if a track is held.
    pub fn preview_handle(&self) -> Option<&MediaHandle> {
        self.preview.as_ref()
    }

    /// Whether a live track has been bound at least once.
    pub fn is_capturing_enabled(&self) -> bool {
        self.capturing_enabled
    }

    /// Playback position in seconds.
    pub fn current_position(&self) -> f64 {
        self.surface.current_time()
    }

    /// Seeks the surface.
    pub fn seek_to(&mut self, seconds: f64) {
        self.surface.set_current_time(seconds);
    }

    /// Length of the bound content in seconds.
    pub fn duration(&self) -> f64 {
        self.surface.duration()
    }

    /// Mute flag of the surface.
    pub fn muted(&self) -> bool {
        self.surface.muted()
    }

    /// Sets the mute flag of the surface.
    pub fn set_muted(&mut self, muted: bool) {
        self.surface.set_muted(muted);
    }

    /// Whether a device request or finalize is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending != Pending::Idle
    }

    #[track_caller]
    fn ensure_idle(&self) -> CoreResult<()> {
        let operation = match self.pending {
            Pending::Idle => return Ok(()),
            Pending::Capture(_) => "device request",
            Pending::Finalize => "finalize",
        };

        Err(SessionError::ConcurrentOperation {
            kind: self.kind,
            operation,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn revoke_recording(&mut self) {
        if let Some(recording) = self.recording.take() {
            self.backend.handles.revoke(&recording);
        }
    }
}

impl Drop for TrackSession {
    fn drop(&mut self) {
        self.stop_stream();
        self.revoke_recording();
    }
}

use crate::{
    MediaHandle, MediaKind, MemberBinding, SessionError, SessionState, TrackSession,
    tests::support::{Harness, ScriptedSurface},
};

const NOMINAL_VOLUME: f64 = 0.5;

/// WHAT: Audio and video surfaces map to their media kind
/// WHY: Every supported surface type must yield a usable session
#[test]
#[allow(clippy::unwrap_used)]
fn given_supported_surface_types_when_creating_session_then_kind_matches() {
    // Given: A backend and one surface per supported type
    let harness = Harness::new();

    for (surface_type, expected) in [("audio", MediaKind::Audio), ("video", MediaKind::Video)] {
        let (surface, _) = ScriptedSurface::new();

        // When: Creating a session for the surface
        let session =
            TrackSession::new(MemberBinding::new(surface, surface_type), harness.backend())
                .unwrap();

        // Then: The session has the matching kind and starts disabled
        assert_eq!(session.kind(), expected);
        assert_eq!(session.state(), SessionState::Disabled);
    }
}

/// WHAT: Unknown surface types are rejected at construction
/// WHY: A session must never exist for media it cannot capture
#[test]
fn given_unsupported_surface_type_when_creating_session_then_unsupported_media_kind() {
    // Given: A surface of an unsupported type
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();

    // When: Creating a session
    let result = TrackSession::new(MemberBinding::new(surface, "canvas"), harness.backend());

    // Then: Construction fails with UnsupportedMediaKind
    assert!(matches!(
        result,
        Err(SessionError::UnsupportedMediaKind { ref surface_type, .. }) if surface_type == "canvas"
    ));
}

/// WHAT: Requesting all media types turns the session into a combined capture
/// WHY: Browsers that record audio and video as one track need a single request
#[test]
#[allow(clippy::unwrap_used)]
fn given_capture_all_media_types_when_creating_session_then_kind_is_multi() {
    // Given: A video surface bound with capture_all_media_types
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let binding = MemberBinding::new(surface, "video").capture_all_media_types(true);

    // When: Creating the session
    let session = TrackSession::new(binding, harness.backend()).unwrap();

    // Then: The kind is Multi and the surface is silent with autoplay off
    assert_eq!(session.kind(), MediaKind::Multi);
    assert!(!log.lock().autoplay);
    assert_eq!(log.lock().volume, 0.0);
}

/// WHAT: A source handle binds existing content without capturing
/// WHY: Previously stored recordings are played back, not re-captured
#[test]
#[allow(clippy::unwrap_used)]
fn given_source_handle_when_creating_session_then_paused_on_that_content() {
    // Given: A binding with an existing content address
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let source = MediaHandle::new("https://cdn.example.com/clip.webm");
    let binding = MemberBinding::new(surface, "video").with_source(Some(source.clone()));

    // When: Creating the session
    let session = TrackSession::new(binding, harness.backend()).unwrap();

    // Then: The surface shows the content, the session is paused, no device was asked
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(log.lock().source, Some(source));
    assert_eq!(harness.acquired(), 0);
}

/// WHAT: Capture binds a muted live preview
/// WHY: The user sees themselves before recording without hearing feedback
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_granted_device_when_capturing_then_preview_bound_and_capturing() {
    // Given: A video session and a device that grants access
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();

    // When: Capturing
    session.capture().await.unwrap();

    // Then: The preview plays silently and capturing is enabled
    assert_eq!(session.state(), SessionState::Capturing);
    assert!(session.is_capturing_enabled());
    let preview = session.preview_handle().cloned().unwrap();
    assert!(harness.handles.resolve(&preview).is_some());
    let log = log.lock();
    assert_eq!(log.source, Some(preview));
    assert!(log.playing);
    assert_eq!(log.volume, 0.0);
}

/// WHAT: A denied device leaves the session untouched
/// WHY: The control surface must be able to prompt again
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_denied_device_when_capturing_then_capture_denied_and_state_unchanged() {
    // Given: A device provider that rejects every request
    let harness = Harness::new();
    harness.deny_capture(true);
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "audio"), harness.backend()).unwrap();

    // When: Capturing
    let result = session.capture().await;

    // Then: CaptureDenied, still disabled, capturing never enabled
    assert!(matches!(
        result,
        Err(SessionError::CaptureDenied {
            kind: MediaKind::Audio,
            ..
        })
    ));
    assert_eq!(session.state(), SessionState::Disabled);
    assert!(!session.is_capturing_enabled());

    // And: A retry after the user grants access succeeds
    harness.deny_capture(false);
    session.capture().await.unwrap();
    assert_eq!(session.state(), SessionState::Capturing);
}

/// WHAT: Recording without a live track fails
/// WHY: record() is only reachable after a successful capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_capture_when_recording_then_no_active_track() {
    // Given: A session that never captured
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();

    // When: Recording
    let result = session.record();

    // Then: NoActiveTrack and the state is unchanged
    assert!(matches!(result, Err(SessionError::NoActiveTrack { .. })));
    assert_eq!(session.state(), SessionState::Disabled);
}

/// WHAT: record then stop yields a bound recording at position zero
/// WHY: The basic round trip every recording UI depends on
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_stopping_then_recording_bound_and_position_reset() {
    // Given: A capturing session that is recording, with the surface mid-way
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    assert_eq!(session.state(), SessionState::Recording);
    log.lock().current_time = 4.2;

    // When: Stopping
    let outcome = session.stop().await.unwrap().unwrap();

    // Then: The recording is bound to the surface and the position is reset
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.has_recording());
    assert_eq!(outcome.kind, MediaKind::Video);
    assert_eq!(session.recording_handle(), Some(&outcome.recording_handle));
    assert_eq!(session.current_position(), 0.0);
    let log = log.lock();
    assert_eq!(log.source, Some(outcome.recording_handle.clone()));
    assert!(!log.playing);
    assert_eq!(log.volume, 0.0);
}

/// WHAT: stop outside recording does not finalize anything
/// WHY: Stopping playback only rewinds
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_capturing_session_when_stopping_then_no_outcome() {
    // Given: A capturing session
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "audio"), harness.backend()).unwrap();
    session.capture().await.unwrap();

    // When: Stopping
    let outcome = session.stop().await.unwrap();

    // Then: Nothing was finalized
    assert!(outcome.is_none());
    assert!(!session.has_recording());
    assert_eq!(session.state(), SessionState::Stopped);
}

/// WHAT: stop_recording outside recording is rejected
/// WHY: Only a running encoder can be finalized
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_capturing_session_when_stop_recording_then_not_recording() {
    // Given: A capturing session
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "audio"), harness.backend()).unwrap();
    session.capture().await.unwrap();

    // When: Finalizing
    let result = session.stop_recording().await;

    // Then: NotRecording
    assert!(matches!(result, Err(SessionError::NotRecording { .. })));
    assert_eq!(session.state(), SessionState::Capturing);
}

/// WHAT: A failed finalize leaves the session recording
/// WHY: A stuck recording must be visible, not reported as complete
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_failing_encoder_when_stopping_then_finalize_failed_and_still_recording() {
    // Given: A recording session whose encoder refuses to finalize
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    harness.fail_finalize(true);

    // When: Stopping
    let result = session.stop().await;

    // Then: FinalizeFailed and the state is still recording
    assert!(matches!(result, Err(SessionError::FinalizeFailed { .. })));
    assert_eq!(session.state(), SessionState::Recording);
    assert!(!session.has_recording());

    // And: Once the encoder recovers the same recording can be finalized
    harness.fail_finalize(false);
    assert!(session.stop().await.unwrap().is_some());
}

/// WHAT: Pausing twice equals pausing once
/// WHY: Repeated gestures must not stack side effects
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_session_when_pausing_twice_then_paused_and_silent() {
    // Given: A stopped recording that is playing
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    session.stop().await.unwrap();
    session.play();
    assert_eq!(log.lock().volume, NOMINAL_VOLUME);
    log.lock().current_time = 1.5;

    // When: Pausing twice
    session.pause();
    session.pause();

    // Then: Paused in place and silent
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(session.current_position(), 1.5);
    let log = log.lock();
    assert!(!log.playing);
    assert_eq!(log.volume, 0.0);
}

/// WHAT: Removing a recording revokes it and resumes the preview
/// WHY: The user can discard a take and record again right away
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_completed_recording_when_removing_then_revoked_and_capturing_again() {
    // Given: A session with a finalized recording
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    let outcome = session.stop().await.unwrap().unwrap();
    let preview = session.preview_handle().cloned().unwrap();

    // When: Removing the recording
    session.remove_recording().await.unwrap();

    // Then: The handle no longer resolves and the preview is live again
    assert!(!session.has_recording());
    assert!(harness.handles.resolve(&outcome.recording_handle).is_none());
    assert_eq!(session.state(), SessionState::Capturing);
    assert_eq!(log.lock().source, Some(preview));
    assert_eq!(harness.acquired(), 1);
}

/// WHAT: Recording again discards the previous take
/// WHY: Only one recording per session is kept alive
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_previous_recording_when_recording_again_then_previous_revoked() {
    // Given: A session with one finalized recording
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "audio"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    let first = session.stop().await.unwrap().unwrap();

    // When: Recording again
    session.record().unwrap();

    // Then: The first take is gone
    assert!(harness.handles.resolve(&first.recording_handle).is_none());
    assert!(!session.has_recording());
    assert_eq!(session.state(), SessionState::Recording);
}

/// WHAT: stop_stream releases the track and is idempotent
/// WHY: Device lights must go off when the widget is torn down
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_capturing_session_when_stopping_stream_twice_then_track_released_once() {
    // Given: A capturing session
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    let preview = session.preview_handle().cloned().unwrap();

    // When: Stopping the stream twice
    session.stop_stream();
    session.stop_stream();

    // Then: The track stopped once, the preview is revoked, recording is impossible
    assert_eq!(harness.stopped_tracks(), 1);
    assert!(harness.handles.resolve(&preview).is_none());
    assert_eq!(session.state(), SessionState::Disabled);
    assert!(matches!(
        session.record(),
        Err(SessionError::NoActiveTrack { .. })
    ));
}

/// WHAT: Dropping a session releases everything it owns
/// WHY: Removed members must not leak device access or handles
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_session_with_recording_when_dropped_then_handles_revoked() {
    // Given: A session holding a track, a preview and a recording
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    session.stop().await.unwrap();
    assert_eq!(harness.handles.len(), 2);

    // When: Dropping it
    drop(session);

    // Then: No handle survives and the track is stopped
    assert!(harness.handles.is_empty());
    assert_eq!(harness.stopped_tracks(), 1);
}

/// WHAT: Playback reaching the end stops the session
/// WHY: The control bar returns to its stopped layout after a clip finishes
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_session_when_surface_ends_then_stopped() {
    // Given: A playing recording
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    session.capture().await.unwrap();
    session.record().unwrap();
    session.stop().await.unwrap();
    session.play();

    // When: The surface reports the end, and the session is checked
    assert!(!session.handle_playback_ended());
    log.lock().ended = true;
    let stopped = session.handle_playback_ended();

    // Then: The session stopped
    assert!(stopped);
    assert_eq!(session.state(), SessionState::Stopped);
}

/// WHAT: Mute and seek delegate to the surface
/// WHY: The control bar reads and writes these directly
#[test]
#[allow(clippy::unwrap_used)]
fn given_session_when_muting_and_seeking_then_surface_updated() {
    // Given: A session
    let harness = Harness::new();
    let (surface, log) = ScriptedSurface::new();
    log.lock().duration = 12.0;
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "audio"), harness.backend()).unwrap();

    // When: Muting and seeking
    session.set_muted(true);
    session.seek_to(3.0);

    // Then: The surface reflects both
    assert!(session.muted());
    assert_eq!(session.current_position(), 3.0);
    assert_eq!(session.duration(), 12.0);
}

/// WHAT: Mutators are refused while a device request is open, until stop_stream cancels it
/// WHY: A session has one device request at a time, and a cancelled one must not wedge it
#[test]
#[allow(clippy::unwrap_used)]
fn given_open_device_request_when_recording_then_concurrent_operation() {
    // Given: A session with a device request handed out but not answered
    let harness = Harness::new();
    let (surface, _) = ScriptedSurface::new();
    let mut session =
        TrackSession::new(MemberBinding::new(surface, "video"), harness.backend()).unwrap();
    assert!(session.begin_capture().is_ok());
    assert!(session.is_busy());

    // When: Recording or capturing again
    let record = session.record();
    let capture = session.begin_capture();

    // Then: Both are refused, naming the open request
    assert!(matches!(
        record,
        Err(SessionError::ConcurrentOperation {
            kind: MediaKind::Video,
            operation: "device request",
            ..
        })
    ));
    assert!(matches!(
        capture,
        Err(SessionError::ConcurrentOperation { .. })
    ));

    // And: stop_stream cancels the request and a new one can be opened
    session.stop_stream();
    assert!(!session.is_busy());
    assert!(session.begin_capture().is_ok());
    assert_eq!(session.state(), SessionState::Disabled);
}

//! Control bar bound to a session group.
//!
//! Binds the playback surfaces, translates gestures into group commands and
//! keeps the scrub bar in step with playback.

use crate::{AppResult, ScrubBar, config::Config};

use media_recorder_core::{
    Advanced, GroupSnapshot, MediaHandle, MediaKind, MemberBinding, MemberFailure,
    PlaybackSurface, SessionGroup, StopOutcome,
};
use tracing::{info, instrument, warn};

/// Creates playback surfaces the control bar binds on its own.
pub trait SurfaceFactory: Send + Sync {
    /// A new surface of the given type (`audio` or `video`).
    fn create(&self, surface_type: &str) -> Box<dyn PlaybackSurface>;
}

/// What to bind and how.
pub struct ControlsOptions {
    /// The host's video surface, if it has one.
    pub video_surface: Option<Box<dyn PlaybackSurface>>,
    /// Existing content for the video surface; skips capture.
    pub video_source: Option<MediaHandle>,
    /// Existing content for the audio surface; skips capture.
    pub audio_source: Option<MediaHandle>,
    /// Bind audio next to video.
    pub include_audio: bool,
    /// One combined audio+video capture on the video surface.
    pub combined_capture: bool,
    /// Recording ceiling in seconds.
    pub max_recording_seconds: u64,
    /// Initial mute state.
    pub muted: bool,
}

impl ControlsOptions {
    /// Options from configuration, with no pre-existing content.
    pub fn from_config(config: &Config, video_surface: Option<Box<dyn PlaybackSurface>>) -> Self {
        Self {
            video_surface,
            video_source: None,
            audio_source: None,
            include_audio: config.recording.include_audio,
            combined_capture: config.recording.combined_capture,
            max_recording_seconds: config.recording.max_recording_seconds,
            muted: config.playback.muted,
        }
    }
}

/// The three commands an embedding host may drive directly.
#[derive(Clone)]
pub struct ControlsApi {
    group: SessionGroup,
}

impl ControlsApi {
    /// Starts recording on every member.
    pub async fn record(&self) -> Vec<MemberFailure> {
        self.group.record().await
    }

    /// Plays every member from its current position.
    pub async fn play(&self) {
        self.group.play().await;
    }

    /// Stops every member, finalizing a running recording.
    pub async fn stop(&self) -> StopOutcome {
        self.group.stop().await
    }
}

/// Members bound without content, still to be captured.
///
/// Runs apart from the control bar: a device prompt may never be answered.
pub struct PendingCaptures {
    group: SessionGroup,
    members: Vec<(usize, MediaKind)>,
}

impl PendingCaptures {
    /// Captures each member in turn. Failures are returned so the caller
    /// can report them and re-prompt later.
    pub async fn run(self) -> Vec<MemberFailure> {
        let mut failures = Vec::new();

        for (index, kind) in self.members {
            if let Err(error) = self.group.capture_member(index).await {
                warn!(member = index, kind = %kind, error = ?error, "Capture failed");
                failures.push(MemberFailure { index, kind, error });
            }
        }

        failures
    }
}

/// Headless control bar.
pub struct RecorderControls {
    group: SessionGroup,
    scrub: ScrubBar,
}

impl RecorderControls {
    /// Binds surfaces to `group` without capturing.
    ///
    /// The returned [`PendingCaptures`] lists the members that still need a
    /// device; the control bar is usable before they get one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::Session`] if a surface cannot be bound.
    #[instrument(skip_all, fields(
        include_audio = options.include_audio,
        combined_capture = options.combined_capture,
    ))]
    pub async fn attach(
        group: SessionGroup,
        options: ControlsOptions,
        surfaces: &dyn SurfaceFactory,
    ) -> AppResult<(Self, PendingCaptures)> {
        let ControlsOptions {
            video_surface,
            video_source,
            audio_source,
            include_audio,
            combined_capture,
            max_recording_seconds,
            muted,
        } = options;

        group.set_max_recording_seconds(max_recording_seconds).await;

        let mut pending = Vec::new();

        if combined_capture {
            if let Some(surface) = video_surface {
                let kind = if include_audio {
                    MediaKind::Multi
                } else {
                    MediaKind::Video
                };
                let needs_capture = video_source.is_none();
                let binding = MemberBinding::new(surface, "video")
                    .with_source(video_source)
                    .capture_all_media_types(include_audio);
                let index = group.add_member(binding).await?;
                if needs_capture {
                    pending.push((index, kind));
                }
            }
        } else {
            if include_audio {
                let needs_capture = audio_source.is_none();
                let binding =
                    MemberBinding::new(surfaces.create("audio"), "audio").with_source(audio_source);
                let index = group.add_member(binding).await?;
                if needs_capture {
                    pending.push((index, MediaKind::Audio));
                }
            }

            if let Some(surface) = video_surface {
                let needs_capture = video_source.is_none();
                let binding = MemberBinding::new(surface, "video").with_source(video_source);
                let index = group.add_member(binding).await?;
                if needs_capture {
                    pending.push((index, MediaKind::Video));
                }
            }
        }

        group.set_muted(muted).await;

        info!(
            members = group.len().await,
            pending = pending.len(),
            "Controls bound"
        );

        Ok((
            Self {
                group: group.clone(),
                scrub: ScrubBar::new(),
            },
            PendingCaptures {
                group,
                members: pending,
            },
        ))
    }

    /// Handle for embedders.
    pub fn api(&self) -> ControlsApi {
        ControlsApi {
            group: self.group.clone(),
        }
    }

    /// Scrub bar state.
    pub fn scrub_bar(&self) -> &ScrubBar {
        &self.scrub
    }

    /// The single record/stop/play/pause button.
    pub async fn advance(&self) -> Advanced {
        self.group.advance_state().await
    }

    /// Starts recording, as the embedder API does.
    pub async fn record(&self) -> Vec<MemberFailure> {
        self.api().record().await
    }

    /// Stops recording or playback, as the embedder API does.
    pub async fn stop(&self) -> StopOutcome {
        self.api().stop().await
    }

    /// Starts playback, as the embedder API does.
    pub async fn play(&self) {
        self.api().play().await;
    }

    /// Pauses playback in place.
    pub async fn pause(&self) {
        self.group.pause().await;
    }

    /// Moves every member to `seconds`.
    pub async fn seek(&self, seconds: f64) {
        self.group.seek_to(seconds).await;
    }

    /// Discards the take and returns to live preview.
    pub async fn remove_recording(&self) -> Vec<MemberFailure> {
        self.group.remove_recording().await
    }

    /// Mutes or unmutes every member.
    pub async fn set_muted(&self, muted: bool) {
        self.group.set_muted(muted).await;
    }

    /// Scrub handle pressed: stop following playback and pause.
    pub async fn scrub_start(&mut self) {
        self.scrub.begin_drag();
        self.group.pause().await;
    }

    /// Scrub handle released: follow playback again.
    pub fn scrub_end(&mut self) {
        self.scrub.end_drag();
    }

    /// Scrub value changed: move every member there.
    pub async fn scrub_to(&mut self, seconds: f64) {
        self.scrub.drag_to(seconds);
        self.group.seek_to(self.scrub.position()).await;
    }

    /// Stops members that played to the end and moves the scrub bar.
    ///
    /// Returns how many members were stopped.
    pub async fn refresh(&mut self) -> usize {
        let stopped = self.group.sync_playback_ended().await;
        self.scrub.follow(self.group.current_position().await);
        stopped
    }

    /// Every observable property of the group.
    pub async fn status(&self) -> GroupSnapshot {
        self.group.snapshot().await
    }

    /// Teardown: stop whatever runs, then release every device.
    #[instrument(skip(self))]
    pub async fn destroy(self) -> StopOutcome {
        let outcome = self.group.stop().await;
        self.group.stop_stream().await;

        info!(
            recordings = outcome.recordings.len(),
            failures = outcome.failures.len(),
            "Controls destroyed"
        );

        outcome
    }
}

use crate::{AppCommand, AppResult, RecorderControls, scrub_bar::format_time};

use std::time::Duration;

use media_recorder_core::{Advanced, GroupEvent, MemberFailure, RecordingOutcome, StopOutcome};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// How often the scrub bar follows playback.
pub(crate) const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Main application state.
///
/// Owns the control bar; receives typed commands from the input handler and
/// clock events from the session group.
pub struct App {
    pub(crate) controls: RecorderControls,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) events: broadcast::Receiver<GroupEvent>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    /// Correlates the logs of one recording take.
    pub(crate) take_id: Option<Uuid>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Media recorder starting");

        let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
        refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    self.handle_command(cmd).await;
                }

                event = self.events.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed clock events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Session group gone, shutting down");
                        break;
                    }
                },

                _ = refresh.tick() => {
                    let stopped = self.controls.refresh().await;
                    if stopped > 0 {
                        info!(members = stopped, "Playback reached the end");
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        let outcome = self.controls.destroy().await;
        log_stop(self.take_id, &outcome);

        let _ = self.shutdown_tx.send(true);
        info!("Media recorder shut down successfully");

        Ok(())
    }

    /// Apply one command to the control bar.
    #[instrument(skip(self))]
    pub(crate) async fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Advance => match self.controls.advance().await {
                Advanced::Recording(failures) => self.recording_started(&failures),
                Advanced::Stopped(outcome) => self.stopped(&outcome),
                Advanced::Playing => info!("Playing"),
                Advanced::Paused => info!("Paused"),
                Advanced::Unchanged => warn!("Nothing to advance, capture first"),
            },
            AppCommand::Record => {
                let failures = self.controls.record().await;
                self.recording_started(&failures);
            }
            AppCommand::Stop => {
                let outcome = self.controls.stop().await;
                self.stopped(&outcome);
            }
            AppCommand::Play => self.controls.play().await,
            AppCommand::Pause => self.controls.pause().await,
            AppCommand::Seek(seconds) => self.controls.seek(seconds).await,
            AppCommand::ScrubStart => self.controls.scrub_start().await,
            AppCommand::ScrubEnd => self.controls.scrub_end(),
            AppCommand::Scrub(seconds) => self.controls.scrub_to(seconds).await,
            AppCommand::RemoveRecording => {
                let failures = self.controls.remove_recording().await;
                report_failures("Remove recording", &failures);
                info!("Back to live preview");
            }
            AppCommand::SetMuted(muted) => self.controls.set_muted(muted).await,
            AppCommand::Status => {
                let snapshot = self.controls.status().await;
                info!(
                    state = ?snapshot.state,
                    position = %format_time(snapshot.current_position),
                    duration = snapshot.duration,
                    elapsed_secs = snapshot.elapsed_recording_seconds,
                    max_secs = snapshot.max_recording_seconds,
                    muted = snapshot.muted,
                    members = snapshot.members.len(),
                    scrub = %self.controls.scrub_bar().formatted(),
                    scrub_tracking = self.controls.scrub_bar().is_tracking(),
                    "Status"
                );
            }
            AppCommand::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: GroupEvent) {
        match event {
            GroupEvent::Tick { elapsed_secs } => {
                info!(take_id = ?self.take_id, elapsed = %format_time(elapsed_secs as f64), "Recording");
            }
            GroupEvent::AutoStopped {
                recordings,
                failed_members,
            } => {
                info!(take_id = ?self.take_id, "Maximum recording time reached");
                log_recordings(self.take_id, &recordings);
                for member in failed_members {
                    error!(take_id = ?self.take_id, member, "Recording could not be finalized");
                }
                self.take_id = None;
            }
        }
    }

    fn recording_started(&mut self, failures: &[MemberFailure]) {
        let take_id = Uuid::new_v4();
        self.take_id = Some(take_id);

        report_failures("Record", failures);
        info!(take_id = %take_id, "Recording started");
    }

    fn stopped(&mut self, outcome: &StopOutcome) {
        log_stop(self.take_id, outcome);
        if outcome.failures.is_empty() {
            self.take_id = None;
        }
    }
}

fn log_stop(take_id: Option<Uuid>, outcome: &StopOutcome) {
    log_recordings(take_id, &outcome.recordings);
    report_failures("Stop", &outcome.failures);
}

fn log_recordings(take_id: Option<Uuid>, recordings: &[RecordingOutcome]) {
    for recording in recordings {
        info!(
            take_id = ?take_id,
            kind = %recording.kind,
            handle = %recording.recording_handle,
            mime = recording.blob.mime_type(),
            size_bytes = recording.blob.len(),
            "Recording finalized"
        );
    }
}

fn report_failures(action: &str, failures: &[MemberFailure]) {
    for failure in failures {
        error!(
            action,
            member = failure.index,
            kind = %failure.kind,
            error = %failure.error,
            "Member failed"
        );
    }
}

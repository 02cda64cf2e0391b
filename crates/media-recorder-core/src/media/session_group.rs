//! Lockstep control of several track sessions.
//!
//! A [`SessionGroup`] fans every command out to its members in registration
//! order and presents one aggregate state and timeline. Member 0 is the
//! reference member: its state is the group state, and its duration and
//! position are the group's whenever the group is not recording.
//!
//! Device requests and finalizing are awaited with the group lock released,
//! so a pending permission prompt never blocks readers, `stop_stream` or the
//! recording clock.

use crate::{
    media::{
        MediaBackend, MediaHandle, MediaKind, MemberBinding, RecordingOutcome, SessionState,
        TrackSession,
        timer::RecordingTimer,
        track_session::{CaptureReply, CaptureRequest, CaptureStep, FinalizeReply, FinalizeRequest},
    },
    {CoreResult, SessionError},
};

use std::{
    panic::Location,
    sync::{Arc, Weak},
};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

/// Recording ceiling used when none is configured.
pub const DEFAULT_MAX_RECORDING_SECONDS: u64 = 120;

const EVENT_CAPACITY: usize = 64;

/// A member-local failure during a fan-out command.
#[derive(Debug)]
pub struct MemberFailure {
    /// Registration index of the member.
    pub index: usize,
    /// Kind of the member.
    pub kind: MediaKind,
    /// What went wrong.
    pub error: SessionError,
}

/// Result of stopping every member.
#[derive(Debug, Default)]
pub struct StopOutcome {
    /// Finalized recordings in registration order. Members that were not
    /// recording are omitted.
    pub recordings: Vec<RecordingOutcome>,
    /// Members that failed to finalize; they are still recording.
    pub failures: Vec<MemberFailure>,
}

/// What [`SessionGroup::advance_state`] did.
#[derive(Debug)]
pub enum Advanced {
    /// Recording started.
    Recording(Vec<MemberFailure>),
    /// Recording or playback stopped.
    Stopped(StopOutcome),
    /// Playback started.
    Playing,
    /// Playback paused.
    Paused,
    /// The group state has no next step.
    Unchanged,
}

/// Notifications from the group's background clock.
#[derive(Debug, Clone)]
pub enum GroupEvent {
    /// One more second was recorded.
    Tick {
        /// Seconds recorded so far.
        elapsed_secs: u64,
    },
    /// The maximum recording time was reached and the group stopped itself.
    AutoStopped {
        /// Finalized recordings in registration order.
        recordings: Vec<RecordingOutcome>,
        /// Registration indices of members that failed to finalize.
        failed_members: Vec<usize>,
    },
}

/// Observable state of one member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSnapshot {
    /// Kind of the member.
    pub kind: MediaKind,
    /// Member state.
    pub state: SessionState,
    /// Whether the member is bound to a finalized recording.
    pub has_recording: bool,
    /// Handle of that recording.
    pub recording_handle: Option<MediaHandle>,
    /// Whether a live track was bound at least once.
    pub is_capturing_enabled: bool,
    /// Whether a device request or finalize is outstanding.
    pub is_busy: bool,
}

/// Observable state of a whole group at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    /// Aggregate state, `None` without members.
    pub state: Option<SessionState>,
    /// Aggregate duration in seconds.
    pub duration: f64,
    /// Aggregate position in seconds.
    pub current_position: f64,
    /// Seconds recorded in the current recording.
    pub elapsed_recording_seconds: u64,
    /// Recording ceiling in seconds.
    pub max_recording_seconds: u64,
    /// Whether every member has bound a live track.
    pub is_capturing_enabled: bool,
    /// Mute flag of the reference member.
    pub muted: bool,
    /// Per-member state in registration order.
    pub members: Vec<MemberSnapshot>,
}

pub(crate) enum TickOutcome {
    Continue,
    CeilingReached,
    Idle,
}

/// A session and the id that outlives index shifts from `remove_member`.
struct Member {
    id: u64,
    session: TrackSession,
}

pub(crate) struct GroupInner {
    backend: MediaBackend,
    members: Vec<Member>,
    next_member_id: u64,
    elapsed_recording_secs: u64,
    max_recording_secs: u64,
    pub(crate) timer: RecordingTimer,
    event_tx: broadcast::Sender<GroupEvent>,
}

impl GroupInner {
    fn reference(&self) -> Option<&TrackSession> {
        self.members.first().map(|member| &member.session)
    }

    fn sessions_mut(&mut self) -> impl Iterator<Item = &mut TrackSession> {
        self.members.iter_mut().map(|member| &mut member.session)
    }

    fn state(&self) -> Option<SessionState> {
        self.reference().map(TrackSession::state)
    }

    fn duration(&self) -> f64 {
        if self.state() == Some(SessionState::Recording) {
            return self.elapsed_recording_secs as f64;
        }

        self.reference().map(TrackSession::duration).unwrap_or(0.0)
    }

    fn current_position(&self) -> f64 {
        match self.state() {
            Some(SessionState::Capturing) => 0.0,
            Some(SessionState::Recording) => self.elapsed_recording_secs as f64,
            _ => self
                .reference()
                .map(|reference| round_to_tenth(reference.current_position()))
                .unwrap_or(0.0),
        }
    }

    fn is_capturing_enabled(&self) -> bool {
        self.members
            .iter()
            .all(|member| member.session.is_capturing_enabled())
    }

    fn muted(&self) -> bool {
        self.reference().is_some_and(TrackSession::muted)
    }

    pub(crate) fn emit(&self, event: GroupEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    /// Advances the recording clock by one tick.
    ///
    /// The ceiling is checked before counting, so a ceiling of zero (or one
    /// lowered below the elapsed time) stops without another second.
    pub(crate) fn tick_recording(&mut self) -> TickOutcome {
        if self.state() != Some(SessionState::Recording) {
            return TickOutcome::Idle;
        }

        if self.elapsed_recording_secs >= self.max_recording_secs {
            return TickOutcome::CeilingReached;
        }

        self.elapsed_recording_secs += 1;
        self.emit(GroupEvent::Tick {
            elapsed_secs: self.elapsed_recording_secs,
        });

        if self.elapsed_recording_secs >= self.max_recording_secs {
            TickOutcome::CeilingReached
        } else {
            TickOutcome::Continue
        }
    }

    fn record(&mut self, group: Weak<Mutex<GroupInner>>) -> Vec<MemberFailure> {
        let mut failures = Vec::new();

        for (index, member) in self.members.iter_mut().enumerate() {
            if let Err(error) = member.session.record() {
                warn!(member = index, error = ?error, "Member failed to start recording");
                failures.push(MemberFailure {
                    index,
                    kind: member.session.kind(),
                    error,
                });
            }
        }

        self.elapsed_recording_secs = 0;

        if self.state() == Some(SessionState::Recording) {
            self.timer.start(group);
        } else {
            self.timer.cancel();
        }

        failures
    }

    /// Opens a device request on every member `begin` asks one for.
    fn begin_captures<F>(&mut self, mut begin: F) -> (Vec<(u64, CaptureRequest)>, Vec<MemberFailure>)
    where
        F: FnMut(&mut TrackSession) -> CoreResult<CaptureStep>,
    {
        let mut requests = Vec::new();
        let mut failures = Vec::new();

        for (index, member) in self.members.iter_mut().enumerate() {
            match begin(&mut member.session) {
                Ok(CaptureStep::Rebound) => {}
                Ok(CaptureStep::Acquire(request)) => requests.push((member.id, request)),
                Err(error) => {
                    warn!(member = index, error = ?error, "Member failed to capture");
                    failures.push(MemberFailure {
                        index,
                        kind: member.session.kind(),
                        error,
                    });
                }
            }
        }

        (requests, failures)
    }

    /// Hands device replies back to their members. Replies for removed
    /// members are released.
    fn complete_captures(&mut self, replies: Vec<(u64, CaptureReply)>) -> Vec<MemberFailure> {
        let mut failures = Vec::new();

        for (id, reply) in replies {
            let Some((index, member)) = self
                .members
                .iter_mut()
                .enumerate()
                .find(|(_, member)| member.id == id)
            else {
                debug!(member_id = id, "Member removed while its device was requested");
                reply.discard(&self.backend.handles);
                continue;
            };

            if let Err(error) = member.session.complete_capture(reply) {
                warn!(member = index, error = ?error, "Member failed to capture");
                failures.push(MemberFailure {
                    index,
                    kind: member.session.kind(),
                    error,
                });
            }
        }

        failures
    }

    /// Cancels the clock, rewinds idle members and takes the encoders of
    /// recording ones.
    fn begin_stop(&mut self) -> (Vec<(u64, FinalizeRequest)>, StopOutcome) {
        self.timer.cancel();

        let mut requests = Vec::new();
        let mut outcome = StopOutcome::default();

        for (index, member) in self.members.iter_mut().enumerate() {
            if member.session.state() != SessionState::Recording {
                member.session.finish_stop(false);
                continue;
            }

            match member.session.begin_stop_recording() {
                Ok(request) => requests.push((member.id, request)),
                Err(error) => {
                    warn!(member = index, error = ?error, "Member failed to stop");
                    outcome.failures.push(MemberFailure {
                        index,
                        kind: member.session.kind(),
                        error,
                    });
                }
            }
        }

        (requests, outcome)
    }

    fn complete_stop(&mut self, replies: Vec<(u64, FinalizeReply)>, outcome: &mut StopOutcome) {
        for (id, reply) in replies {
            let Some((index, member)) = self
                .members
                .iter_mut()
                .enumerate()
                .find(|(_, member)| member.id == id)
            else {
                debug!(member_id = id, "Member removed while finalizing");
                reply.discard(&self.backend.handles);
                continue;
            };

            match member.session.complete_stop_recording(reply) {
                Ok(recording) => {
                    member.session.finish_stop(true);
                    outcome.recordings.push(recording);
                }
                Err(error) => {
                    warn!(member = index, error = ?error, "Member failed to stop");
                    outcome.failures.push(MemberFailure {
                        index,
                        kind: member.session.kind(),
                        error,
                    });
                }
            }
        }

        outcome.failures.sort_by_key(|failure| failure.index);
    }

    fn play(&mut self) {
        self.sessions_mut().for_each(TrackSession::play);
    }

    fn pause(&mut self) {
        self.sessions_mut().for_each(TrackSession::pause);
    }

    #[track_caller]
    fn member_mut(&mut self, index: usize) -> CoreResult<&mut Member> {
        let len = self.members.len();
        let caller = Location::caller();
        self.members
            .get_mut(index)
            .ok_or_else(|| SessionError::MemberNotFound {
                index,
                len,
                location: ErrorLocation::from(caller),
            })
    }
}

/// Stops every member of `group`, finalizing with the lock released.
///
/// Resolves once the slowest member has finished finalizing.
pub(crate) async fn stop_members(group: &Mutex<GroupInner>) -> StopOutcome {
    let (requests, mut outcome) = group.lock().await.begin_stop();

    let mut replies = Vec::with_capacity(requests.len());
    for (id, request) in requests {
        replies.push((id, request.finalize().await));
    }

    group.lock().await.complete_stop(replies, &mut outcome);

    outcome
}

/// Ordered collection of track sessions driven as one recording session.
///
/// Cloning yields another handle to the same group.
#[derive(Clone)]
pub struct SessionGroup {
    inner: Arc<Mutex<GroupInner>>,
}

impl SessionGroup {
    /// Creates an empty group with the default recording ceiling.
    pub fn new(backend: MediaBackend) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Mutex::new(GroupInner {
                backend,
                members: Vec::new(),
                next_member_id: 0,
                elapsed_recording_secs: 0,
                max_recording_secs: DEFAULT_MAX_RECORDING_SECONDS,
                timer: RecordingTimer::default(),
                event_tx,
            })),
        }
    }

    /// Subscribes to clock events.
    pub async fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.inner.lock().await.event_tx.subscribe()
    }

    /// Binds a new member and returns its registration index.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedMediaKind`] for an unknown surface
    /// type; no member is added in that case.
    #[instrument(skip_all, fields(surface_type = %binding.surface_type))]
    pub async fn add_member(&self, binding: MemberBinding) -> CoreResult<usize> {
        let mut inner = self.inner.lock().await;
        let session = TrackSession::new(binding, inner.backend.clone())?;

        let id = inner.next_member_id;
        inner.next_member_id += 1;
        inner.members.push(Member { id, session });
        let index = inner.members.len() - 1;

        info!(member = index, "Member added");

        Ok(index)
    }

    /// Tears a member down, releasing its track and handles.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MemberNotFound`] for an unknown index.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, index: usize) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.member_mut(index)?;

        let removed = inner.members.remove(index);
        if inner.members.is_empty() {
            inner.timer.cancel();
        }

        info!(member = index, kind = %removed.session.kind(), "Member removed");

        Ok(())
    }

    /// Number of members.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    /// Whether the group has no members.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.members.is_empty()
    }

    /// Captures every member. Failures are member-local.
    ///
    /// Device requests are awaited one after another in registration order,
    /// without holding the group.
    #[instrument(skip(self))]
    pub async fn capture(&self) -> Vec<MemberFailure> {
        let (requests, failures) = self
            .inner
            .lock()
            .await
            .begin_captures(|session| session.begin_capture());

        self.acquire_all(requests, failures).await
    }

    /// Captures a single member.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MemberNotFound`] for an unknown index, or the
    /// member's capture error.
    #[instrument(skip(self))]
    pub async fn capture_member(&self, index: usize) -> CoreResult<()> {
        let (id, request) = {
            let mut inner = self.inner.lock().await;
            let member = inner.member_mut(index)?;
            match member.session.begin_capture()? {
                CaptureStep::Rebound => return Ok(()),
                CaptureStep::Acquire(request) => (member.id, request),
            }
        };

        let reply = request.acquire().await;

        let mut inner = self.inner.lock().await;
        match inner.complete_captures(vec![(id, reply)]).pop() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }

    /// Starts recording on every member and restarts the recording clock.
    #[instrument(skip(self))]
    pub async fn record(&self) -> Vec<MemberFailure> {
        let mut inner = self.inner.lock().await;
        let failures = inner.record(Arc::downgrade(&self.inner));

        info!(failures = failures.len(), "Group recording");

        failures
    }

    /// Stops every member and cancels the recording clock.
    ///
    /// Resolves once the slowest member has finished finalizing.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> StopOutcome {
        let outcome = stop_members(&self.inner).await;

        info!(
            recordings = outcome.recordings.len(),
            failures = outcome.failures.len(),
            "Group stopped"
        );

        outcome
    }

    /// Plays every member.
    #[instrument(skip(self))]
    pub async fn play(&self) {
        self.inner.lock().await.play();
    }

    /// Pauses every member.
    #[instrument(skip(self))]
    pub async fn pause(&self) {
        self.inner.lock().await.pause();
    }

    /// Drops every member's recording and returns to live preview.
    #[instrument(skip(self))]
    pub async fn remove_recording(&self) -> Vec<MemberFailure> {
        let (requests, failures) = {
            let mut inner = self.inner.lock().await;
            inner.timer.cancel();
            inner.begin_captures(|session| session.begin_remove_recording())
        };

        self.acquire_all(requests, failures).await
    }

    /// Releases every member's device track and cancels open device
    /// requests.
    #[instrument(skip(self))]
    pub async fn stop_stream(&self) {
        let mut inner = self.inner.lock().await;
        inner.timer.cancel();
        inner.sessions_mut().for_each(TrackSession::stop_stream);

        info!("All streams stopped");
    }

    /// Single-button transition driven by the aggregate state.
    ///
    /// `capturing -> record`, `recording -> stop`, `paused | stopped -> play`,
    /// `playing -> pause`; anything else is a no-op.
    #[instrument(skip(self))]
    pub async fn advance_state(&self) -> Advanced {
        let mut inner = self.inner.lock().await;

        let advanced = match inner.state() {
            Some(SessionState::Capturing) => {
                Advanced::Recording(inner.record(Arc::downgrade(&self.inner)))
            }
            Some(SessionState::Recording) => {
                drop(inner);
                let outcome = stop_members(&self.inner).await;
                debug!(failures = outcome.failures.len(), "Advanced to stopped");
                return Advanced::Stopped(outcome);
            }
            Some(SessionState::Paused | SessionState::Stopped) => {
                inner.play();
                Advanced::Playing
            }
            Some(SessionState::Playing) => {
                inner.pause();
                Advanced::Paused
            }
            Some(SessionState::Disabled) | None => Advanced::Unchanged,
        };

        debug!(state = ?inner.state(), "Advanced");

        advanced
    }

    /// Stops members whose surface played to the end.
    ///
    /// Returns how many members were stopped.
    pub async fn sync_playback_ended(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let mut stopped = 0;

        for session in inner.sessions_mut() {
            if session.handle_playback_ended() {
                stopped += 1;
            }
        }

        stopped
    }

    /// Aggregate state: the reference member's state.
    pub async fn state(&self) -> Option<SessionState> {
        self.inner.lock().await.state()
    }

    /// Recorded seconds while recording, otherwise the reference duration.
    pub async fn duration(&self) -> f64 {
        self.inner.lock().await.duration()
    }

    /// Aggregate playback position in seconds.
    ///
    /// Zero while capturing, recorded seconds while recording, otherwise the
    /// reference position rounded to a tenth of a second.
    pub async fn current_position(&self) -> f64 {
        self.inner.lock().await.current_position()
    }

    /// Seeks every member to the same position.
    #[instrument(skip(self))]
    pub async fn seek_to(&self, seconds: f64) {
        let mut inner = self.inner.lock().await;
        for session in inner.sessions_mut() {
            session.seek_to(seconds);
        }
    }

    /// Whether every member has bound a live track.
    pub async fn is_capturing_enabled(&self) -> bool {
        self.inner.lock().await.is_capturing_enabled()
    }

    /// Mute flag of the reference member.
    pub async fn muted(&self) -> bool {
        self.inner.lock().await.muted()
    }

    /// Mutes or unmutes every member.
    #[instrument(skip(self))]
    pub async fn set_muted(&self, muted: bool) {
        let mut inner = self.inner.lock().await;
        for session in inner.sessions_mut() {
            session.set_muted(muted);
        }
    }

    /// Recording ceiling in seconds.
    pub async fn max_recording_seconds(&self) -> u64 {
        self.inner.lock().await.max_recording_secs
    }

    /// Sets the recording ceiling, read by the clock on every tick.
    #[instrument(skip(self))]
    pub async fn set_max_recording_seconds(&self, seconds: u64) {
        self.inner.lock().await.max_recording_secs = seconds;
    }

    /// Seconds recorded in the current or last recording.
    pub async fn elapsed_recording_seconds(&self) -> u64 {
        self.inner.lock().await.elapsed_recording_secs
    }

    /// Whether the recording clock is running.
    pub async fn is_timer_running(&self) -> bool {
        self.inner.lock().await.timer.is_running()
    }

    /// Every observable property at once.
    pub async fn snapshot(&self) -> GroupSnapshot {
        let inner = self.inner.lock().await;

        GroupSnapshot {
            state: inner.state(),
            duration: inner.duration(),
            current_position: inner.current_position(),
            elapsed_recording_seconds: inner.elapsed_recording_secs,
            max_recording_seconds: inner.max_recording_secs,
            is_capturing_enabled: inner.is_capturing_enabled(),
            muted: inner.muted(),
            members: inner
                .members
                .iter()
                .map(|Member { session, .. }| MemberSnapshot {
                    kind: session.kind(),
                    state: session.state(),
                    has_recording: session.has_recording(),
                    recording_handle: session.recording_handle().cloned(),
                    is_capturing_enabled: session.is_capturing_enabled(),
                    is_busy: session.is_busy(),
                })
                .collect(),
        }
    }

    /// Awaits device requests in order, then completes them under the lock.
    async fn acquire_all(
        &self,
        requests: Vec<(u64, CaptureRequest)>,
        mut failures: Vec<MemberFailure>,
    ) -> Vec<MemberFailure> {
        if requests.is_empty() {
            return failures;
        }

        let mut replies = Vec::with_capacity(requests.len());
        for (id, request) in requests {
            replies.push((id, request.acquire().await));
        }

        failures.extend(self.inner.lock().await.complete_captures(replies));
        failures.sort_by_key(|failure| failure.index);

        failures
    }
}

fn round_to_tenth(seconds: f64) -> f64 {
    (seconds * 10.0).round() / 10.0
}
